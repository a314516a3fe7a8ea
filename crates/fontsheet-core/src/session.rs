// Copyright (c) 2023 the Fontsheet contributors.
// SPDX-License-Identifier: AGPL-3.0-or-later
//
// This file is part of Fontsheet.
//
// Fontsheet is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Fontsheet is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with Fontsheet. If not, see <https://www.gnu.org/licenses/>.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::deferred::{Deferred, Outcome};
use crate::error::{GenerationError, GenerationResult};
use crate::host::{FontLoader, RenderHost};
use crate::pipeline::{FontSheet, Generator};
use crate::request::GenerationRequest;

pub const PNG_MIME: &str = "image/png";
pub const XML_MIME: &str = "text/xml";
pub const JSON_MIME: &str = "text/json";

/// A downloadable export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime: &'static str,
    pub data: Bytes,
}

type PendingSheet = Deferred<Arc<FontSheet>, GenerationError>;

struct SessionState {
    request: GenerationRequest,
    sheet: Option<Arc<FontSheet>>,
    pending: Option<PendingSheet>,
    history: Vec<GenerationRequest>,
}

/// The state behind a generator front end: the current parameters, the
/// exports prepared from them and a history of parameter snapshots.
///
/// Prepared exports only ever belong to the current parameters. Changing
/// them drops the exports and cancels any pass still in flight, whose result
/// is then discarded when it arrives.
pub struct ExportSession<L, H: RenderHost> {
    generator: Arc<Generator<L, H>>,
    state: Mutex<SessionState>,
}

impl<L: FontLoader, H: RenderHost> ExportSession<L, H> {
    pub fn new(generator: Arc<Generator<L, H>>, request: GenerationRequest) -> Self {
        Self {
            generator,
            state: Mutex::new(SessionState {
                request,
                sheet: None,
                pending: None,
                history: Vec::new(),
            }),
        }
    }

    pub fn generator(&self) -> &Arc<Generator<L, H>> {
        &self.generator
    }

    pub fn request(&self) -> GenerationRequest {
        self.state.lock().request.clone()
    }

    /// Replaces the current parameters.
    ///
    /// Returns whether anything changed. A change invalidates prepared
    /// exports and cancels the pass in flight.
    pub fn set_request(&self, request: GenerationRequest) -> bool {
        let mut state = self.state.lock();
        if state.request == request {
            return false;
        }

        state.request = request;

        if let Some(pending) = state.pending.take() {
            if pending.cancel() {
                debug!("Canceled generation pass in flight");
            }
        }

        if state.sheet.take().is_some() {
            info!("Parameters changed; prepared exports invalidated");
        }

        true
    }

    /// Edits the current parameters in place. See [Self::set_request].
    pub fn update_request(&self, edit: impl FnOnce(&mut GenerationRequest)) -> bool {
        let mut request = self.request();
        edit(&mut request);
        self.set_request(request)
    }

    pub fn exports_enabled(&self) -> bool {
        self.state.lock().sheet.is_some()
    }

    pub fn sheet(&self) -> Option<Arc<FontSheet>> {
        self.state.lock().sheet.clone()
    }

    /// Runs a full pass over the current parameters and keeps its result
    /// for export.
    ///
    /// Exports prepared earlier for the same parameters stay available until
    /// the pass succeeds, and are kept if it fails.
    ///
    /// Resolves to [GenerationError::Canceled] if the parameters change
    /// before the pass finishes.
    pub async fn prepare_exports(&self) -> GenerationResult<Arc<FontSheet>> {
        let (request, deferred) = {
            let mut state = self.state.lock();
            if let Some(stale) = state.pending.take() {
                stale.cancel();
            }

            let deferred = PendingSheet::new();
            state.pending = Some(deferred.clone());
            (state.request.clone(), deferred)
        };

        let result = self.generator.generate(&request).await;

        {
            let mut state = self.state.lock();

            let settled = match result {
                Ok(sheet) => {
                    let sheet = Arc::new(sheet);
                    let settled = deferred.resolve(sheet.clone());
                    if settled {
                        state.sheet = Some(sheet);
                    }

                    settled
                }
                Err(err) => deferred.reject(err),
            };

            if !settled {
                debug!("Discarding result of superseded generation pass");
            }

            let current = state
                .pending
                .as_ref()
                .map(|pending| pending.ptr_eq(&deferred))
                .unwrap_or(false);

            if current {
                state.pending = None;
            }
        }

        match deferred.wait().await {
            Outcome::Done(sheet) => Ok(sheet),
            Outcome::Rejected(err) => Err(err),
            Outcome::Canceled => Err(GenerationError::Canceled),
        }
    }

    /// Records the current parameters in the history. Returns the new
    /// history length.
    pub fn snapshot_layer(&self) -> usize {
        let mut state = self.state.lock();
        let request = state.request.clone();
        state.history.push(request);
        debug!("Recorded layer {}", state.history.len());
        state.history.len()
    }

    pub fn history(&self) -> Vec<GenerationRequest> {
        self.state.lock().history.clone()
    }

    /// The prepared sheet image, if exports are enabled.
    pub fn export_png(&self) -> Option<ExportFile> {
        let sheet = self.sheet()?;
        Some(ExportFile {
            file_name: sheet.request.png_name(),
            mime: PNG_MIME,
            data: sheet.png.clone(),
        })
    }

    /// The prepared descriptor, if exports are enabled.
    pub fn export_xml(&self) -> Option<ExportFile> {
        let sheet = self.sheet()?;
        Some(ExportFile {
            file_name: sheet.request.xml_name(),
            mime: XML_MIME,
            data: Bytes::from(sheet.xml.clone()),
        })
    }

    /// The parameter history as a JSON array, if any layer was recorded.
    pub fn export_json(&self) -> Option<ExportFile> {
        let state = self.state.lock();
        if state.history.is_empty() {
            return None;
        }

        match serde_json::to_vec_pretty(&state.history) {
            Ok(data) => Some(ExportFile {
                file_name: state.request.json_name(),
                mime: JSON_MIME,
                data: data.into(),
            }),
            Err(err) => {
                warn!("Failed to serialize parameter history: {:?}", err);
                None
            }
        }
    }
}
