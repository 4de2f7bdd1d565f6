pub mod completion;
pub mod decode;
pub mod extract;
pub mod output;
pub mod relay;
