// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Line-delimited JSON channel between the untrusted host and the worker.
//!
//! Each input line is one [`HostMessage`]. Requests answer with one
//! [`RpcReturnValue`] line, in input order. Block imports produce no output.
//! `get_shielding_key` answers with the enclave's public request key.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::error::StfError;
use crate::identity::Identity;
use crate::parentchain::{BlockNumber, ImportedHeight};
use crate::rpc::{Request, RpcReturnValue};
use crate::worker::Worker;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    /// A client request routed through the host.
    Submit { request: Request },
    /// An unsigned call `sender` submitted on the parentchain.
    Relay { sender: Identity, request: Request },
    /// The host imported a parentchain block.
    ImportBlock { height: BlockNumber },
    /// Fetch the public key requests are sealed to.
    GetShieldingKey,
}

pub struct HostChannel {
    worker: Arc<Worker>,
    height: Arc<ImportedHeight>,
}

impl HostChannel {
    pub fn new(worker: Arc<Worker>, height: Arc<ImportedHeight>) -> Self {
        Self { worker, height }
    }

    /// Handle one input line, returning the response if there is one.
    pub async fn handle_line(&self, line: &str) -> Option<RpcReturnValue> {
        let message = match serde_json::from_str::<HostMessage>(line) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "malformed host message");
                return Some(RpcReturnValue::error(&StfError::Dispatch(
                    "malformed host message".into(),
                )));
            }
        };

        match message {
            HostMessage::Submit { request } => Some(self.worker.handle_request(request).await),
            HostMessage::Relay { sender, request } => {
                Some(self.worker.relay_indirect(&sender, request).await)
            }
            HostMessage::ImportBlock { height } => {
                self.height.import(height);
                debug!(height, "parentchain block imported");
                None
            }
            HostMessage::GetShieldingKey => Some(
                serde_json::to_vec(&self.worker.shielding_key())
                    .map(RpcReturnValue::ok)
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "failed to encode shielding key");
                        RpcReturnValue::error(&StfError::Dispatch(
                            "failed to encode shielding key".into(),
                        ))
                    }),
            ),
        }
    }

    /// Serve messages from `input` until it closes.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(&line).await {
                let mut encoded = serde_json::to_vec(&response)?;
                encoded.push(b'\n');
                output.write_all(&encoded).await?;
                output.flush().await?;
            }
        }
        Ok(())
    }
}
