use wasm_bindgen::prelude::*;

pub mod game;
pub mod helper;
pub mod participants;
pub mod pattern;

use game::PatternTogether;

bloom_web::export_game!(PatternTogether, "pattern-together");
