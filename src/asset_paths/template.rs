use std::collections::BTreeSet;
use std::path::Path;

/// Expand a clip template such as `clips/anim.###.json` into the files it matches.
///
/// Each `#` stands for one digit. Matches are returned in sorted order, spelled with the
/// template's own directory prefix so they resolve against the same owning document.
pub fn expand_clip_template(template: &str, resolved: &Path) -> Vec<String> {
    let Some(pattern) = template_glob(resolved) else {
        return Vec::new();
    };

    let entries = match glob::glob(&pattern) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!("invalid clip template {}: {}", template, err);
            return Vec::new();
        }
    };

    let prefix = template
        .replace('\\', "/")
        .rsplit_once('/')
        .map(|(dir, _)| dir.to_string());
    let mut expansion = TemplateExpansion::new(prefix);
    for path in entries.flatten() {
        if path.is_file() {
            expansion.push(&path);
        }
    }
    expansion.finish()
}

/// Only the file name is a template; `#` in a directory name is literal.
fn template_glob(resolved: &Path) -> Option<String> {
    let name = resolved.file_name()?.to_str()?;
    if !name.contains('#') {
        return None;
    }
    let name = name
        .split('#')
        .map(glob::Pattern::escape)
        .collect::<Vec<_>>()
        .join("[0-9]");
    match resolved.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => {
            let dir = glob::Pattern::escape(dir.to_str()?);
            Some(format!("{dir}/{name}"))
        }
        None => Some(name),
    }
}

struct TemplateExpansion {
    prefix: Option<String>,
    seen: BTreeSet<String>,
    result: Vec<String>,
}

impl TemplateExpansion {
    fn new(prefix: Option<String>) -> Self {
        Self {
            prefix,
            seen: BTreeSet::new(),
            result: Vec::new(),
        }
    }

    fn push(&mut self, path: &Path) {
        let Some(name) = path.file_name() else {
            return;
        };
        let name = name.to_string_lossy();
        let raw = match &self.prefix {
            Some(dir) => format!("{dir}/{name}"),
            None => name.into_owned(),
        };
        if self.seen.insert(raw.clone()) {
            self.result.push(raw);
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.result.sort();
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn expands_digits_only() {
        let dir = tempdir().unwrap();
        let clips = dir.path().join("clips");
        fs::create_dir_all(&clips).unwrap();
        for name in ["clip.002.json", "clip.001.json", "clip.x01.json", "clip.0001.json"] {
            fs::write(clips.join(name), "{}").unwrap();
        }

        let expanded = expand_clip_template("clips/clip.###.json", &clips.join("clip.###.json"));
        assert_eq!(expanded, vec![
            "clips/clip.001.json".to_string(),
            "clips/clip.002.json".to_string(),
        ]);
    }

    #[test]
    fn plain_paths_expand_to_nothing() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("clip.json"), "{}").unwrap();
        assert!(expand_clip_template("clip.json", &dir.path().join("clip.json")).is_empty());
    }

    #[test]
    fn glob_metacharacters_in_directories_are_literal() {
        let dir = tempdir().unwrap();
        let odd = dir.path().join("take[1]");
        fs::create_dir_all(&odd).unwrap();
        fs::write(odd.join("a.01.json"), "{}").unwrap();

        let expanded = expand_clip_template("take[1]/a.##.json", &odd.join("a.##.json"));
        assert_eq!(expanded, vec!["take[1]/a.01.json".to_string()]);
    }

    #[test]
    fn hashes_in_directories_are_literal() {
        let dir = tempdir().unwrap();
        let shot = dir.path().join("shot#1");
        fs::create_dir_all(&shot).unwrap();
        fs::write(shot.join("a.01.json"), "{}").unwrap();
        let decoy = dir.path().join("shot11");
        fs::create_dir_all(&decoy).unwrap();
        fs::write(decoy.join("a.02.json"), "{}").unwrap();

        let expanded = expand_clip_template("shot#1/a.##.json", &shot.join("a.##.json"));
        assert_eq!(expanded, vec!["shot#1/a.01.json".to_string()]);
    }
}
