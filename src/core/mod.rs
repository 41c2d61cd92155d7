//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Scanner: SIMD-accelerated delimiter detection using memchr
//! - Tokenizer: pull tokenizer for XML token extraction
//! - Entities: reference decoding with Cow (zero-copy when possible) and the
//!   HTML named reference table
//! - Attributes: attribute list parsing

pub mod attributes;
pub mod entities;
pub mod scanner;
pub mod tokenizer;
