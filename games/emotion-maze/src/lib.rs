use wasm_bindgen::prelude::*;

pub mod game;
pub mod maze;
use game::EmotionMaze;

bloom_web::export_game!(EmotionMaze, "emotion-maze");
