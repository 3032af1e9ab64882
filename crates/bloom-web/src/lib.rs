pub mod runner;
pub mod storage;

pub use runner::GameRunner;
pub use storage::{CallbackGateway, LocalStorageStore};

#[doc(hidden)]
pub use bloom_engine;
#[doc(hidden)]
pub use js_sys;

/// Generate all `#[wasm_bindgen]` exports for an activity.
///
/// Generates:
/// - `thread_local!` storage for the GameRunner
/// - `with_runner()` helper function
/// - All wasm-bindgen exports (lifecycle, input handlers, manifest loading,
///   session persistence, media and snapshot accessors)
///
/// # Usage
///
/// ```ignore
/// use wasm_bindgen::prelude::*;
///
/// mod game;
/// use game::MyActivity;
///
/// bloom_web::export_game!(MyActivity, "my-activity");
/// ```
///
/// The calling crate depends on `wasm-bindgen`, `log`, `console_log` and
/// `console_error_panic_hook`.
#[macro_export]
macro_rules! export_game {
    ($game_type:ty, $game_name:literal) => {
        use std::cell::RefCell;
        use $crate::bloom_engine::InputEvent;

        thread_local! {
            static RUNNER: RefCell<Option<$crate::GameRunner<$game_type>>> = RefCell::new(None);
        }

        fn with_runner<R>(f: impl FnOnce(&mut $crate::GameRunner<$game_type>) -> R) -> R {
            RUNNER.with(|cell| {
                let mut borrow = cell.borrow_mut();
                let runner = borrow.as_mut().expect("Activity not initialized. Call game_init() first.");
                f(runner)
            })
        }

        #[wasm_bindgen]
        pub fn game_init() {
            console_error_panic_hook::set_once();
            let _ = console_log::init_with_level(log::Level::Info);

            let mut runner = $crate::GameRunner::new(<$game_type>::new());
            match $crate::LocalStorageStore::open() {
                Some(store) => runner.set_store(Box::new(store)),
                None => log::warn!("{}: localStorage unavailable, sessions staged in memory", $game_name),
            }

            RUNNER.with(|cell| {
                *cell.borrow_mut() = Some(runner);
            });

            with_runner(|r| r.init());
            log::info!("{}: initialized", $game_name);
        }

        #[wasm_bindgen]
        pub fn game_restart() {
            with_runner(|r| {
                r.shutdown();
                r.init();
            });
        }

        #[wasm_bindgen]
        pub fn game_shutdown() {
            with_runner(|r| r.shutdown());
            log::info!("{}: shut down", $game_name);
        }

        #[wasm_bindgen]
        pub fn game_tick(dt: f32) {
            with_runner(|r| r.tick(dt));
        }

        #[wasm_bindgen]
        pub fn game_pointer_down(x: f32, y: f32) {
            with_runner(|r| r.push_input(InputEvent::PointerDown { x, y }));
        }

        #[wasm_bindgen]
        pub fn game_pointer_up(x: f32, y: f32) {
            with_runner(|r| r.push_input(InputEvent::PointerUp { x, y }));
        }

        #[wasm_bindgen]
        pub fn game_pointer_move(x: f32, y: f32) {
            with_runner(|r| r.push_input(InputEvent::PointerMove { x, y }));
        }

        #[wasm_bindgen]
        pub fn game_key_down(key_code: u32) {
            with_runner(|r| r.push_input(InputEvent::KeyDown { key_code }));
        }

        #[wasm_bindgen]
        pub fn game_key_up(key_code: u32) {
            with_runner(|r| r.push_input(InputEvent::KeyUp { key_code }));
        }

        #[wasm_bindgen]
        pub fn game_custom_event(kind: u32, a: f32, b: f32, c: f32) {
            with_runner(|r| r.push_input(InputEvent::Custom { kind, a, b, c }));
        }

        #[wasm_bindgen]
        pub fn game_load_manifest(json: &str) -> bool {
            with_runner(|r| r.load_manifest(json))
        }

        // ---- Media ----

        #[wasm_bindgen]
        pub fn game_unlock_audio() {
            with_runner(|r| r.unlock_audio());
        }

        #[wasm_bindgen]
        pub fn game_set_muted(muted: bool) {
            with_runner(|r| r.set_muted(muted));
        }

        #[wasm_bindgen]
        pub fn take_media_commands() -> String {
            with_runner(|r| r.take_media_json())
        }

        // ---- Sessions ----

        #[wasm_bindgen]
        pub fn game_set_session_gateway(callback: $crate::js_sys::Function) {
            with_runner(|r| r.set_gateway(Box::new($crate::CallbackGateway::new(callback))));
        }

        #[wasm_bindgen]
        pub fn game_flush_sessions() -> u32 {
            with_runner(|r| r.flush_sessions())
        }

        #[wasm_bindgen]
        pub fn get_staged_session_count() -> u32 {
            with_runner(|r| r.staged_sessions())
        }

        // ---- Data accessors ----

        #[wasm_bindgen]
        pub fn get_snapshot_json() -> String {
            with_runner(|r| r.snapshot_json())
        }

        #[wasm_bindgen]
        pub fn get_game_events_ptr() -> *const f32 {
            with_runner(|r| r.game_events_ptr())
        }

        #[wasm_bindgen]
        pub fn get_game_events_len() -> u32 {
            with_runner(|r| r.game_events_len())
        }

        #[wasm_bindgen]
        pub fn get_max_events() -> u32 {
            with_runner(|r| r.max_events())
        }

        #[wasm_bindgen]
        pub fn get_world_width() -> f32 {
            with_runner(|r| r.world_width())
        }

        #[wasm_bindgen]
        pub fn get_world_height() -> f32 {
            with_runner(|r| r.world_height())
        }
    };
}
