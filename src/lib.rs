// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dynscope
//!
//! Reconstruction of .NET dynamic method bodies from runtime captures.
//!
//! Code generated at runtime through `System.Reflection.Emit.DynamicMethod` never lands in a
//! metadata table. Its opcode bytes, symbol scope, exception clauses and locals live in private
//! runtime objects, and every token inside the body indexes that private scope instead of a
//! metadata table. `dynscope` takes such a captured object graph and rebuilds a regular method
//! body from it: decoded instructions with resolved operands, exception regions, locals and a
//! method signature, all imported into a destination symbol space.
//!
//! ## Features
//!
//! - **Layout tolerant capture** - Delegates, `DynamicMethod`s, resolvers and `DynamicILInfo`
//!   objects under both the current and the legacy runtime field names
//! - **Full CIL decoding** - Every ECMA-335 opcode, with branch operands linked to instructions
//! - **Both exception encodings** - Compact and fat raw sections as well as structured
//!   `ILGenerator` bookkeeping
//! - **Parallel batches** - Independent sessions over a shared, lock-free symbol space
//!
//! ## Quick Start
//!
//! ```rust
//! use dynscope::prelude::*;
//!
//! let resolver = HostSnapshot::new("System.Reflection.Emit.DynamicResolver")
//!     .with_field("_code", vec![0x72u8, 0x01, 0x00, 0x00, 0x70, 0x2A]) // ldstr; ret
//!     .with_field("_stackSize", 1)
//!     .with_field(
//!         "_scope",
//!         HostSnapshot::new("System.Reflection.Emit.DynamicScope")
//!             .with_field("_tokens", HostValue::List(vec![HostValue::Null, "secret".into()])),
//!     )
//!     .with_null("_exceptions")
//!     .with_null("_exceptionHeader")
//!     .with_null("_localSignature")
//!     .with_field("_method", RuntimeMethod::new(None, "Unpack"))
//!     .into_ref();
//!
//! let space = SymbolSpace::new();
//! let method = reconstruct(Some(&resolver), &space, ReconstructionConfig::default())?;
//!
//! assert_eq!(method.instructions[0].operand, Operand::String("secret".into()));
//! # Ok::<(), dynscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`capture`] - Normalizes host object graphs into a [`capture::RawMethodCapture`]
//! - [`symbols`] - Resolves scope indices and imports references into a [`symbols::SymbolSpace`]
//! - [`metadata`] - Tokens and signature blob decoding
//! - [`disassembler`] - CIL instruction decoding
//! - [`method`] - Exception regions and the [`method::ReconstructionSession`]
//! - [`batch`] - Parallel reconstruction of many captures
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Logging
//!
//! Progress is reported through the `log` facade. No logger is installed by this crate.

#[macro_use]
pub(crate) mod error;

pub(crate) mod stream;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
pub mod prelude;

/// Normalization of host runtime objects into raw method captures
pub mod capture;

/// Reconstruction configuration
pub mod config;

/// Tokens and signature decoding based on ECMA-335
pub mod metadata;

/// Symbol resolution and the destination symbol space
pub mod symbols;

/// Instructions, Disassembler based on ECMA-335
///
/// # Examples
///
/// ```rust
/// use dynscope::disassembler::decode_stream;
/// use dynscope::symbols::{SymbolResolver, SymbolSpace};
/// use dynscope::ReconstructionConfig;
///
/// let space = SymbolSpace::new();
/// let config = ReconstructionConfig::default();
/// let mut resolver = SymbolResolver::new(&[], &space, &config);
///
/// let instructions = decode_stream(&[0x00, 0x2A], &mut resolver)?; // nop, ret
/// println!("Mnemonic: {}", instructions[1].mnemonic);
/// # Ok::<(), dynscope::Error>(())
/// ```
pub mod disassembler;

/// Exception regions and reconstruction sessions
pub mod method;

/// Parallel reconstruction
pub mod batch;

/// `dynscope` Result type
pub type Result<T> = std::result::Result<T, Error>;

/// `dynscope` Error type
pub use error::Error;

/// Provides access to low-level parsing functionality
pub use stream::parser::Parser;

/// Configuration shared by reconstruction sessions
pub use config::ReconstructionConfig;
