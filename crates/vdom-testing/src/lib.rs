//! Testing utilities and harness for Vdom-RS

pub mod shape;
pub mod testing;

pub use shape::*;
pub use testing::*;

pub mod prelude {
    pub use crate::shape::*;
    pub use crate::testing::*;
}
