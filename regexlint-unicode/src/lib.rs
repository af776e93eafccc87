//! ECMAScript Unicode utils.
/*!
## Features
- [`class`]: the fixed character tables ECMAScript regular expressions are defined over
  (white space, line terminators, word characters).
- [`case`]: the `Canonicalize` mapping used by case-insensitive matching without the `u`/`v` flags.

## Crate features
*/
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![cfg_attr(feature = "doc", doc = document_features::document_features!())]
pub mod case;
pub mod class;

mod private {
    pub trait Sealed {}
}
use private::Sealed;

impl Sealed for char {}
