mod decrypt;
mod derive;
mod encrypt;
mod misc;

pub use decrypt::{handle_decrypt, handle_decrypt_file};
pub use derive::handle_derive;
pub use encrypt::{handle_encrypt_answers, handle_encrypt_file};
pub use misc::{handle_completions, handle_export_public};
