use brandsite_core::AdminContext;

// App state
pub struct AppState {
   pub context: AdminContext,
}
