use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::terminal::Terminal;

#[derive(Debug, Error)]
pub enum NoDocumentError {
    #[error("{0} does not exist")]
    NotFound(PathBuf),

    #[error("no PDF files found in {0}")]
    NoneInDirectory(PathBuf),

    #[error("no document was selected")]
    NotSelected,

    #[error("could not list {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

/// PDF files directly inside `dir`, sorted by name.
pub fn find_pdfs(dir: &Path) -> Result<Vec<PathBuf>, NoDocumentError> {
    let entries = std::fs::read_dir(dir).map_err(|source| NoDocumentError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut pdfs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

/// Uses `requested` when given, otherwise lets the user pick a PDF from `dir`.
pub fn select_document<R: BufRead, W: Write>(
    requested: Option<PathBuf>,
    dir: &Path,
    term: &mut Terminal<R, W>,
) -> Result<PathBuf, NoDocumentError> {
    if let Some(path) = requested {
        if !path.is_file() {
            return Err(NoDocumentError::NotFound(path));
        }
        return Ok(path);
    }

    let pdfs = find_pdfs(dir)?;
    if pdfs.is_empty() {
        return Err(NoDocumentError::NoneInDirectory(dir.to_path_buf()));
    }

    let io_err = |source| NoDocumentError::Io {
        path: dir.to_path_buf(),
        source,
    };
    term.info("Available PDF files:").map_err(io_err)?;
    for (i, pdf) in pdfs.iter().enumerate() {
        let name = pdf.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        term.line(&format!("  {}. {}", i + 1, name)).map_err(io_err)?;
    }

    let prompt = format!("\nSelect a PDF (1-{}): ", pdfs.len());
    loop {
        let Some(choice) = term.ask(&prompt).map_err(io_err)? else {
            return Err(NoDocumentError::NotSelected);
        };
        match choice.parse::<usize>() {
            Ok(n) if (1..=pdfs.len()).contains(&n) => return Ok(pdfs[n - 1].clone()),
            _ => term.warn("Invalid selection").map_err(io_err)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_with(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for name in files {
            std::fs::write(dir.path().join(name), b"%PDF-1.4").unwrap();
        }
        dir
    }

    #[test]
    fn lists_only_pdfs_in_name_order() {
        let dir = dir_with(&["b.pdf", "notes.txt", "A.PDF", "c.pdf"]);
        let names: Vec<_> = find_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["A.PDF", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn interactive_choice_reprompts_on_bad_input() {
        let dir = dir_with(&["one.pdf", "two.pdf"]);
        let mut out = Vec::new();
        let mut term = Terminal::new("7\nabc\n2\n".as_bytes(), &mut out);

        let chosen = select_document(None, dir.path(), &mut term).unwrap();
        assert_eq!(chosen, dir.path().join("two.pdf"));

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1. one.pdf"));
        assert_eq!(text.matches("Invalid selection").count(), 2);
    }

    #[test]
    fn empty_directory_is_no_document() {
        let dir = dir_with(&["readme.md"]);
        let mut out = Vec::new();
        let mut term = Terminal::new("".as_bytes(), &mut out);

        let err = select_document(None, dir.path(), &mut term).unwrap_err();
        assert!(matches!(err, NoDocumentError::NoneInDirectory(_)));
    }

    #[test]
    fn closed_input_selects_nothing() {
        let dir = dir_with(&["one.pdf"]);
        let mut out = Vec::new();
        let mut term = Terminal::new("".as_bytes(), &mut out);

        let err = select_document(None, dir.path(), &mut term).unwrap_err();
        assert!(matches!(err, NoDocumentError::NotSelected));
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = dir_with(&["given.pdf"]);
        let mut out = Vec::new();
        let mut term = Terminal::new("".as_bytes(), &mut out);

        let given = dir.path().join("given.pdf");
        assert_eq!(select_document(Some(given.clone()), dir.path(), &mut term).unwrap(), given);

        let missing = dir.path().join("missing.pdf");
        assert!(matches!(
            select_document(Some(missing), dir.path(), &mut term),
            Err(NoDocumentError::NotFound(_))
        ));
    }
}
