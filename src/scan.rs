use anyhow::{Context, Result};
use image::ImageFormat;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// The container format of a picture, determined by its file name.
///
/// Matching is done on the whole lowercase file name, so a bare `.png`
/// (a dotfile with no stem) still counts as a picture.
///
/// # Example
///
/// ```rust
/// use drawing_metadata_retriever::scan::ImageKind;
/// use std::path::Path;
///
/// assert_eq!(ImageKind::from_path(Path::new("sketch.PNG")), Some(ImageKind::Png));
/// assert_eq!(ImageKind::from_path(Path::new("scan.tif")), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Tiff,
}

impl ImageKind {
    /// Determine the image kind from a file name suffix.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        if name.ends_with(".jpg") || name.ends_with(".jpeg") {
            Some(Self::Jpeg)
        } else if name.ends_with(".png") {
            Some(Self::Png)
        } else if name.ends_with(".gif") {
            Some(Self::Gif)
        } else if name.ends_with(".tiff") {
            Some(Self::Tiff)
        } else {
            None
        }
    }

    /// The decoder format used to probe the container header.
    pub fn format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
            Self::Tiff => ImageFormat::Tiff,
        }
    }
}

/// Check if a file name ends in `.jpg`, `.jpeg`, `.png`, `.gif` or `.tiff`, ignoring case.
pub fn is_picture(path: &Path) -> bool {
    ImageKind::from_path(path).is_some()
}

/// Pictures found under a root, split by whether they sit directly in it.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Absolute root the walk started from.
    pub root: PathBuf,
    /// Pictures whose parent is the root.
    pub root_files: Vec<PathBuf>,
    /// Pictures in any subdirectory, in walk order.
    pub sub_files: Vec<PathBuf>,
}

/// A folder and the pictures directly inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderGroup {
    pub folder: PathBuf,
    pub files: Vec<PathBuf>,
}

impl ScanResult {
    /// Total number of pictures found.
    pub fn len(&self) -> usize {
        self.root_files.len() + self.sub_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Group pictures by their parent folder.
    ///
    /// Root pictures always form the first group. Subdirectory groups follow
    /// in order of first appearance, and each folder appears exactly once even
    /// if its pictures were not contiguous in the input.
    pub fn folders(&self) -> Vec<FolderGroup> {
        let mut groups = Vec::new();
        if !self.root_files.is_empty() {
            groups.push(FolderGroup {
                folder: self.root.clone(),
                files: self.root_files.clone(),
            });
        }
        groups.extend(group_by_parent(&self.sub_files));
        groups
    }
}

fn group_by_parent(files: &[PathBuf]) -> Vec<FolderGroup> {
    let mut groups: Vec<FolderGroup> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for file in files {
        let folder = file.parent().map(Path::to_path_buf).unwrap_or_default();
        match index.get(&folder) {
            Some(&i) => groups[i].files.push(file.clone()),
            None => {
                index.insert(folder.clone(), groups.len());
                groups.push(FolderGroup {
                    folder,
                    files: vec![file.clone()],
                });
            }
        }
    }

    groups
}

/// Files before directories, then by file name.
fn walk_order(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Collect pictures under `root`, partitioned into root-level and subdirectory files.
///
/// The root is made absolute before walking so every reported folder path is
/// absolute. A root that cannot be walked is an error; unreadable entries deeper
/// in the tree are logged and skipped.
///
/// # Example
///
/// ```rust,no_run
/// use drawing_metadata_retriever::scan::collect_images;
/// use std::path::Path;
///
/// let scan = collect_images(Path::new("./drawings"), false).unwrap();
/// for group in scan.folders() {
///     println!("{}: {} picture(s)", group.folder.display(), group.files.len());
/// }
/// ```
pub fn collect_images(root: &Path, follow_links: bool) -> Result<ScanResult> {
    // Rebuilt from components so `/art/` and `/art` report the same folder
    let root: PathBuf = std::path::absolute(root)
        .with_context(|| format!("Failed to resolve {}", root.display()))?
        .components()
        .collect();

    if !root.is_dir() {
        if root.exists() {
            anyhow::bail!("{} is not a directory", root.display());
        }
        anyhow::bail!("{} does not exist", root.display());
    }

    let mut scan = ScanResult {
        root: root.clone(),
        ..Default::default()
    };

    for entry in WalkDir::new(&root)
        .follow_links(follow_links)
        .sort_by(walk_order)
    {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                return Err(e).with_context(|| format!("Failed to read {}", root.display()));
            }
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() || !is_picture(path) {
            continue;
        }

        if path.parent() == Some(root.as_path()) {
            scan.root_files.push(path.to_path_buf());
        } else {
            scan.sub_files.push(path.to_path_buf());
        }
    }

    log::debug!(
        "Found {} picture(s) in root, {} in subdirectories",
        scan.root_files.len(),
        scan.sub_files.len()
    );

    Ok(scan)
}
