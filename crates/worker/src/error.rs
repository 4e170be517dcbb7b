// SPDX-License-Identifier: MIT

use orc_daemon::ClientError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("orcd returned an unexpected response shape for this request")]
    UnexpectedResponse,
}
