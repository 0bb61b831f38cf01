//! # Flashloop Clients
//!
//! Builds size-checked flashloan transactions for leveraged looping and for
//! repaying a borrow with deposited collateral.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flashloop_clients::prelude::*;
//!
//! # async fn example<L: LendingInstructionBuilder>(
//! #   rpc: SolanaRpcProvider,
//! #   lending: L,
//! #   args: LoopingArgs,
//! # ) -> Result<()> {
//! let jupiter = std::sync::Arc::new(JupiterClient::new(JupiterConfig::from_env())?);
//! let assembler = FlashloanAssembler::new(jupiter.clone(), rpc, lending);
//! let engine = Flashloop::new(jupiter, assembler);
//!
//! match engine.calculate_looping_params(&args).await {
//!   Ok(params) => println!("fits at tier {}", params.tier),
//!   Err(action) => println!("{action}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Pieces
//!
//! - [`Flashloop`] - the three public calculations
//! - [`SizeTieredQuoteSearch`] - account-limit backoff around quote and build
//! - [`FlashloanAssembler`] - instruction layout and lookup table compression
//! - [`size`] - transaction size and key count classification

pub mod assembler;
pub mod engine;
pub mod instructions;
pub mod looping;
pub mod prelude;
pub mod repay_collateral;
pub mod rpc;
pub mod size;
pub mod tiered_search;
pub mod util;

pub use assembler::FlashloanAssembler;
pub use engine::Flashloop;
pub use tiered_search::SizeTieredQuoteSearch;
