mod encryption;

pub use encryption::Encryptor;
