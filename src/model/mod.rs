pub mod message;
pub mod model_identity;
pub mod session_state;
pub mod state_delta;
pub mod turn;
