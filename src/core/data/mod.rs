pub mod encoding;
pub mod table;

pub use encoding::{encode_feature, encode_labels, LabelEncoder};
pub use table::{Column, Table};
