pub mod codec;
pub mod types;
pub mod value;

// 编解码核心类型
pub use codec::{Codec, CodecBuilder, CodecError, CodecResult};
pub use types::{Column, DataType};
pub use value::Value;
