// src/test_support.rs
//! Stand-ins for ps2pdf and pdf2svg: small shell scripts that log each call.
//! Shared by the unit tests and, through the `test-support` feature, by the
//! integration tests.

use std::path::Path;
use std::sync::Mutex;

use crate::preview::Notifier;

pub const SAMPLE_EPS: &[u8] = b"%!PS-Adobe-3.0 EPSF-3.0\n%%BoundingBox: 0 0 10 10\nnewpath 0 0 moveto 10 10 lineto stroke\n";

/// Keeps every user-visible message.
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

pub fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[cfg(unix)]
pub use scripts::{write_script, FakeTools};

#[cfg(unix)]
mod scripts {
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use tempfile::TempDir;

    use crate::config::Config;
    use crate::convert::{Converter, ExternalTool};

    const SVG_OPEN: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><desc>"#;
    const SVG_CLOSE: &str = "</desc></svg>";

    const PS2PDF_ARGS_CHECK: &str = "[ \"$1\" = \"-dEPSCrop\" ] && [ \"$2\" = \"-\" ] || exit 2\n";

    pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// A scratch tree with `bin/` (the fake tools), `tmp/` (run artifacts)
    /// and `docs/` (sources).
    pub struct FakeTools {
        root: TempDir,
    }

    enum Behaviour {
        Works,
        Fails,
        Silent,
        /// Writes its output, then hangs for a few seconds.
        Slow,
    }

    impl FakeTools {
        pub fn working() -> Self {
            Self::build(Behaviour::Works, Behaviour::Works)
        }

        pub fn failing_ps2pdf() -> Self {
            Self::build(Behaviour::Fails, Behaviour::Works)
        }

        pub fn failing_pdf2svg() -> Self {
            Self::build(Behaviour::Works, Behaviour::Fails)
        }

        pub fn silent_pdf2svg() -> Self {
            Self::build(Behaviour::Works, Behaviour::Silent)
        }

        pub fn slow_ps2pdf() -> Self {
            Self::build(Behaviour::Slow, Behaviour::Works)
        }

        fn build(ps2pdf: Behaviour, pdf2svg: Behaviour) -> Self {
            let root = tempfile::tempdir().unwrap();
            for dir in ["bin", "tmp", "docs"] {
                std::fs::create_dir(root.path().join(dir)).unwrap();
            }
            let bin = root.path().join("bin");

            let ps2pdf_log = root.path().join("ps2pdf.calls");
            let ps2pdf_body = match ps2pdf {
                Behaviour::Works => format!("{}cat > \"$3\"\n", PS2PDF_ARGS_CHECK),
                Behaviour::Fails => "echo 'Error: /undefined in not' >&2\nexit 1\n".to_string(),
                Behaviour::Silent => "exit 0\n".to_string(),
                Behaviour::Slow => format!("{}cat > \"$3\"\nsleep 5\n", PS2PDF_ARGS_CHECK),
            };
            write_script(
                &bin,
                "ps2pdf",
                &format!("echo run >> '{}'\n{}", ps2pdf_log.display(), ps2pdf_body),
            );

            let pdf2svg_log = root.path().join("pdf2svg.calls");
            let pdf2svg_body = match pdf2svg {
                Behaviour::Works => format!(
                    "{{ printf '%s' '{}'; cat \"$1\"; printf '%s' '{}'; }} > \"$2\"\n",
                    SVG_OPEN, SVG_CLOSE
                ),
                Behaviour::Fails => "echo 'Unable to open the pdf' >&2\nexit 1\n".to_string(),
                Behaviour::Silent => "exit 0\n".to_string(),
                Behaviour::Slow => format!(
                    "sleep 5\n{{ printf '%s' '{}'; cat \"$1\"; printf '%s' '{}'; }} > \"$2\"\n",
                    SVG_OPEN, SVG_CLOSE
                ),
            };
            write_script(
                &bin,
                "pdf2svg",
                &format!("echo run >> '{}'\n{}", pdf2svg_log.display(), pdf2svg_body),
            );

            FakeTools { root }
        }

        pub fn root(&self) -> PathBuf {
            self.root.path().join("docs")
        }

        pub fn temp_dir(&self) -> PathBuf {
            self.root.path().join("tmp")
        }

        /// Entries left in the run-artifact directory.
        pub fn temp_entries(&self) -> usize {
            super::count_entries(&self.temp_dir())
        }

        pub fn ps2pdf_path(&self) -> PathBuf {
            self.root.path().join("bin").join("ps2pdf")
        }

        pub fn pdf2svg_path(&self) -> PathBuf {
            self.root.path().join("bin").join("pdf2svg")
        }

        pub fn config(&self) -> Config {
            let mut config = Config::default();
            config.path.ps2pdf = self.ps2pdf_path().to_string_lossy().to_string();
            config.path.pdf2svg = self.pdf2svg_path().to_string_lossy().to_string();
            config.temp_dir = Some(self.temp_dir());
            config.timeout_secs = 10;
            config.debounce_ms = 100;
            config
        }

        pub fn converter(&self) -> Converter {
            Converter::new(
                ExternalTool::ps2pdf(self.ps2pdf_path().to_string_lossy()),
                ExternalTool::pdf2svg(self.pdf2svg_path().to_string_lossy()),
            )
            .with_temp_dir(self.temp_dir())
            .with_timeout(Some(Duration::from_secs(10)))
        }

        pub fn write_source(&self, name: &str, content: &[u8]) -> PathBuf {
            let path = self.root().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, content).unwrap();
            path
        }

        /// Markup the fake pdf2svg produces for `eps`.
        pub fn expected_svg(&self, eps: &[u8]) -> String {
            format!("{}{}{}", SVG_OPEN, String::from_utf8_lossy(eps), SVG_CLOSE)
        }

        pub fn ps2pdf_calls(&self) -> usize {
            count_lines(&self.root.path().join("ps2pdf.calls"))
        }

        pub fn pdf2svg_calls(&self) -> usize {
            count_lines(&self.root.path().join("pdf2svg.calls"))
        }
    }

    fn count_lines(path: &Path) -> usize {
        std::fs::read_to_string(path).map(|s| s.lines().count()).unwrap_or(0)
    }
}
