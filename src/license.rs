//! License notices.
//!
//! This module contains the license notices written into the install directory.

use crate::layout::Layout;
use std::borrow::Cow;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

/// License of the AWS CDK (Apache License 2.0).
pub(crate) const AWS_CDK_LICENSE: &str = r#"
Apache License
Version 2.0, January 2004
http://www.apache.org/licenses/

Copyright (c) Amazon.com, Inc. or its affiliates. All Rights Reserved.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
"#;

/// License of Node.js (MIT).
pub(crate) const NODE_LICENSE: &str = r#"
The MIT License

Copyright Node.js contributors. All rights reserved.

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to
deal in the Software without restriction, including without limitation the
rights to use, copy, modify, merge, publish, distribute, sublicense, and/or
sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in
all copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS
IN THE SOFTWARE.
"#;

/// A license notice and where it belongs.
#[derive(Clone, Debug)]
pub(crate) struct LicenseRecord {
    /// The name of the licensed component.
    pub(crate) name: &'static str,
    /// The file the notice is written to.
    pub(crate) target_path: PathBuf,
    /// The notice itself.
    pub(crate) text: &'static str,
}

impl LicenseRecord {
    /// Returns the human readable title of the license.
    pub(crate) fn title(&self) -> &'static str {
        match self.name {
            "aws_cdk" => "AWS CDK - Apache License 2.0",
            "node" => "Node.js - MIT License",
            _ => self.name,
        }
    }

    /// Returns the notice written into the install directory, if there is one.
    pub(crate) fn installed_text(&self) -> Option<String> {
        fs::read_to_string(&self.target_path).ok()
    }

    // Writes the notice unless the target already exists. Returns whether it has been written.
    #[instrument(level = "trace", skip(self), fields(name = self.name))]
    fn write_if_missing(&self) -> anyhow::Result<bool> {
        if self.target_path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.target_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // the file is closed when it goes out of scope, whatever happens
        let mut file = File::create(&self.target_path)?;
        file.write_all(self.text.trim().as_bytes())?;
        file.flush()?;

        Ok(true)
    }
}

/// Returns the license notices for the given install directory.
pub(crate) fn records(layout: &Layout) -> Vec<LicenseRecord> {
    vec![
        LicenseRecord {
            name: "aws_cdk",
            target_path: layout.license_path("aws_cdk"),
            text: AWS_CDK_LICENSE,
        },
        LicenseRecord {
            name: "node",
            target_path: layout.license_path("node"),
            text: NODE_LICENSE,
        },
    ]
}

/// Shortens the given text to at most `max_chars` characters, marking the cut with `...`.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => Cow::Owned(format!("{}...", &text[..end])),
        None => Cow::Borrowed(text),
    }
}

/// Writes every missing license notice. Returns the number of notices written.
///
/// This is best effort: failures are logged and never reach the caller.
pub(crate) fn materialize(records: &[LicenseRecord]) -> usize {
    let mut written = 0;
    for record in records {
        match record.write_if_missing() {
            Ok(true) => {
                debug!(path = %record.target_path.display(), "created license notice");
                written += 1;
            }
            Ok(false) => {}
            Err(err) => warn!("Failed to create license notice for {}: {err:#}", record.name),
        }
    }

    written
}
