//! Private supertraits. Only this crate can implement the traits that extend them.

pub trait Sealed {}
pub trait SealedUniform {}
pub trait SealedAttribute {}
pub trait SealedIndex {}
