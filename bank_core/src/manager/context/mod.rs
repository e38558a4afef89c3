// Copyright 2023-, Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Context implementations.
//!
//! Contexts store the bills and the escrow the Bank works on. Currently there's
//! only one implementation available, the in-memory context, which is useful for
//! testing, development and single-process deployments.
pub mod memory;
