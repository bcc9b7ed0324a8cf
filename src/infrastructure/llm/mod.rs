mod rig_model;

pub use rig_model::{chat_model_from_config, RigChatModel};
