//! Where a run writes its files.

use std::path::{Path, PathBuf};

use silencer_models::SegmentSpan;

/// Hidden working directory created next to the merged output.
pub const PARTS_DIR: &str = ".silenced_parts";

/// Concat manifest name inside the working directory.
pub const MANIFEST_NAME: &str = ".filelist";

/// Resolved output locations for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLayout {
    /// Directory segments are written to
    pub dir: PathBuf,
    /// Merged output file, when merging
    pub merged_output: Option<PathBuf>,
    stem: String,
    hidden: bool,
}

impl WorkLayout {
    /// Split mode: segments go straight into `output_dir`.
    pub fn split(input: &Path, output_dir: &Path) -> Self {
        Self {
            dir: output_dir.to_path_buf(),
            merged_output: None,
            stem: file_stem(input),
            hidden: false,
        }
    }

    /// Merge mode: hidden segments in `<output parent>/.silenced_parts`.
    ///
    /// `auto_suffix` replaces the output's extension with the codec suffix.
    pub fn merge(input: &Path, output_file: &Path, auto_suffix: Option<&str>) -> Self {
        let parent = output_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let merged = match auto_suffix {
            Some(suffix) => output_file.with_extension(suffix),
            None => output_file.to_path_buf(),
        };
        Self {
            dir: parent.join(PARTS_DIR),
            merged_output: Some(merged),
            stem: file_stem(input),
            hidden: true,
        }
    }

    pub fn is_merge(&self) -> bool {
        self.merged_output.is_some()
    }

    /// `{prefix}{stem}_{start}-{end}#{audio_index}_{task_index}.{suffix}`
    pub fn segment_path(&self, span: &SegmentSpan, audio_index: usize, suffix: &str) -> PathBuf {
        let prefix = if self.hidden { "." } else { "" };
        let end = span
            .end
            .map(|e| e.normalize().to_string())
            .unwrap_or_else(|| "end".to_string());
        self.dir.join(format!(
            "{}{}_{}-{}#{}_{}.{}",
            prefix,
            self.stem,
            span.start.normalize(),
            end,
            audio_index,
            span.index,
            suffix
        ))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_NAME)
    }
}

fn file_stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use silencer_models::Decimal;
    use std::str::FromStr;

    fn span(index: usize, start: &str, end: Option<&str>) -> SegmentSpan {
        SegmentSpan {
            index,
            start: Decimal::from_str(start).unwrap(),
            end: end.map(|e| Decimal::from_str(e).unwrap()),
        }
    }

    #[test]
    fn test_split_segment_names() {
        let layout = WorkLayout::split(Path::new("/in/talk.m4a"), Path::new("/out"));
        assert!(!layout.is_merge());

        let path = layout.segment_path(&span(2, "12.500", Some("30.25")), 0, "aac");
        assert_eq!(path, PathBuf::from("/out/talk_12.5-30.25#0_2.aac"));

        let path = layout.segment_path(&span(3, "41.0", None), 1, "aac");
        assert_eq!(path, PathBuf::from("/out/talk_41-end#1_3.aac"));
    }

    #[test]
    fn test_merge_layout() {
        let layout = WorkLayout::merge(
            Path::new("/in/talk.m4a"),
            Path::new("/out/clean.mp4"),
            Some("aac"),
        );
        assert_eq!(layout.dir, PathBuf::from("/out/.silenced_parts"));
        assert_eq!(layout.merged_output, Some(PathBuf::from("/out/clean.aac")));
        assert_eq!(
            layout.manifest_path(),
            PathBuf::from("/out/.silenced_parts/.filelist")
        );

        let path = layout.segment_path(&span(0, "1.5", Some("2")), 0, "aac");
        assert_eq!(path, PathBuf::from("/out/.silenced_parts/.talk_1.5-2#0_0.aac"));
    }

    #[test]
    fn test_merge_layout_explicit_suffix_keeps_output() {
        let layout = WorkLayout::merge(Path::new("talk.m4a"), Path::new("clean.m4a"), None);
        assert_eq!(layout.dir, PathBuf::from("./.silenced_parts"));
        assert_eq!(layout.merged_output, Some(PathBuf::from("clean.m4a")));
    }
}
