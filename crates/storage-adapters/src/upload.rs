//! Attachment policy shared by every `FileStorage` adapter: size limit,
//! allowed extensions, filename sanitising, and the on-disk location scheme.

use domains::{DomainError, Id, Result, UserId};

/// 2 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 2 * 1024 * 1024;

/// Longest accepted file name. Keeps the stored location within the
/// `cbra_casefile.file` column and the filesystem's name limit.
pub const NAME_MAX_CHARS: usize = 200;
const NAME_MAX_BYTES: usize = 255;

pub const ALLOWED_EXTENSIONS: [&str; 13] = [
    "txt", "pdf", "doc", "docx", "jpg", "jpeg", "png", "gif", "tif", "tiff", "bmp", "shp", "zip",
];

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::with_max_bytes(DEFAULT_MAX_BYTES)
    }
}

impl UploadPolicy {
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }

    /// Validates an upload and returns the sanitised filename to store it under.
    pub fn check(&self, filename: &str, size: u64) -> Result<String> {
        let name = sanitize_filename(filename)
            .ok_or_else(|| DomainError::Validation(format!("'{filename}' is not a usable file name")))?;
        if name.chars().count() > NAME_MAX_CHARS || name.len() > NAME_MAX_BYTES {
            return Err(DomainError::Validation(format!(
                "file name is longer than {NAME_MAX_CHARS} characters"
            )));
        }

        if size == 0 {
            return Err(DomainError::Validation("file is empty".into()));
        }
        if size > self.max_bytes {
            return Err(DomainError::Validation(format!(
                "file is {size} bytes; the limit is {} bytes",
                self.max_bytes
            )));
        }

        let extension = name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        match extension {
            Some(ext) if self.allowed_extensions.iter().any(|allowed| *allowed == ext) => Ok(name),
            _ => Err(DomainError::Validation(format!(
                "file type of '{name}' is not allowed; accepted: {}",
                self.allowed_extensions.join(", ")
            ))),
        }
    }
}

/// Final path component of a client-supplied name. Rejects names that are
/// empty or refer to a directory.
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

/// `casefiles/<case>/<name>` for staff uploads,
/// `casefiles/<case>/requester/<name>` when there is no uploader.
pub fn case_file_location(case: Id, uploader: Option<UserId>, filename: &str) -> String {
    match uploader {
        Some(_) => format!("casefiles/{case}/{filename}"),
        None => format!("casefiles/{case}/requester/{filename}"),
    }
}

pub fn content_type(filename: &str) -> String {
    mime_guess::from_path(filename).first_or_octet_stream().essence_str().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_groups_by_case_and_uploader_role() {
        assert_eq!(case_file_location(12, Some(3), "map.pdf"), "casefiles/12/map.pdf");
        assert_eq!(case_file_location(12, None, "map.pdf"), "casefiles/12/requester/map.pdf");
    }

    #[test]
    fn path_components_are_stripped() {
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename(r"C:\scans\lot 4.tif").as_deref(), Some("lot 4.tif"));
        assert_eq!(sanitize_filename("uploads/.."), None);
        assert_eq!(sanitize_filename(""), None);
    }

    #[test]
    fn oversized_files_are_rejected() {
        let policy = UploadPolicy::default();
        assert!(policy.check("letter.pdf", DEFAULT_MAX_BYTES).is_ok());
        assert!(policy.check("letter.pdf", DEFAULT_MAX_BYTES + 1).is_err());
    }

    #[test]
    fn only_listed_extensions_pass() {
        let policy = UploadPolicy::default();
        assert_eq!(policy.check("Survey.PNG", 10).unwrap(), "Survey.PNG");
        assert!(policy.check("parcels.shp", 10).is_ok());
        assert!(policy.check("script.exe", 10).is_err());
        assert!(policy.check("README", 10).is_err());
    }

    #[test]
    fn long_names_are_rejected() {
        let policy = UploadPolicy::default();
        let longest = format!("{}.pdf", "a".repeat(NAME_MAX_CHARS - 4));
        assert_eq!(policy.check(&longest, 10).unwrap(), longest);

        let err = policy.check(&format!("{}.pdf", "a".repeat(300)), 10).unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("longer than 200")));
        // Multi-byte names stay under the filesystem's byte limit.
        assert!(policy.check(&format!("{}.pdf", "é".repeat(150)), 10).is_err());
    }

    #[test]
    fn content_type_is_guessed_from_extension() {
        assert_eq!(content_type("letter.pdf"), "application/pdf");
        assert_eq!(content_type("parcels.unknownext"), "application/octet-stream");
    }
}
