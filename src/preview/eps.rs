// src/preview/eps.rs
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use regex::bytes::Regex;

const EPS_EXTENSIONS: [&str; 3] = ["eps", "epsf", "epsi"];

/// Magic number of the binary "DOS EPS" wrapper.
const DOS_EPS_MAGIC: [u8; 4] = [0xC5, 0xD0, 0xD3, 0xC6];

fn epsf_header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        Regex::new(r"^%!PS-Adobe-\d+\.\d+\s+EPSF-\d+\.\d+").expect("valid EPSF header pattern")
    })
}

/// Extension check first, then a look at the first bytes of the file.
pub fn is_eps(path: &Path) -> bool {
    has_eps_extension(path) || sniff(path)
}

pub fn has_eps_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| EPS_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn has_eps_header(head: &[u8]) -> bool {
    head.starts_with(&DOS_EPS_MAGIC) || epsf_header().is_match(head)
}

fn sniff(path: &Path) -> bool {
    let mut head = Vec::with_capacity(64);
    match File::open(path) {
        Ok(file) => match file.take(64).read_to_end(&mut head) {
            Ok(_) => has_eps_header(&head),
            Err(_) => false,
        },
        Err(_) => false,
    }
}
