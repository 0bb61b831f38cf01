#![allow(clippy::missing_errors_doc)]

//! Position math, amount conversion, and transaction limits shared by the
//! looping and collateral-repay builders.

pub mod action;
pub mod conversion;
pub mod error;
pub mod limits;
pub mod looping_math;
pub mod position;
pub mod repay_math;
pub mod slippage_config;
