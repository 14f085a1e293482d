#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use vc_format as format;
pub use vc_serializer as serializer;
pub use vc_utils as utils;
