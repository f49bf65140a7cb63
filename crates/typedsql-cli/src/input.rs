use std::io::Read;
use std::path::Path;

/// Read the whole input: `file`, or stdin when `None`.
pub fn read_source(file: Option<&Path>) -> anyhow::Result<String> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| anyhow::anyhow!("failed to read stdin: {e}"))?;
            buf
        }
    };
    if text.trim().is_empty() {
        anyhow::bail!("no SQL provided (pass a file or pipe SQL to stdin)");
    }
    Ok(text)
}

pub fn source_label(file: Option<&Path>) -> String {
    match file {
        Some(path) => path.display().to_string(),
        None => "stdin".to_string(),
    }
}
