//! Subcommand table for the executable under test.
//!
//! `u6fs` is driven as `u6fs <image> <subcommand> [args...]`. One enum
//! maps each subcommand to its argument shape; a single runner executes
//! them all.

use std::path::{Path, PathBuf};

/// One `u6fs` subcommand with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subcommand {
    /// `sb` — print the superblock.
    Superblock,
    /// `inode` — scan and print all inodes.
    InodeScan,
    /// `cat1 <inr>` — print the first sector of an inode's file.
    CatFirstSector { inode: u16 },
    /// `tree` — print the directory tree from the root.
    Tree,
    /// `shafiles` — print the SHA of every file.
    ShaFiles,
    /// `bm` — print the inode and sector bitmaps.
    Bitmaps,
    /// `mkdir <path>` — create a directory in the image.
    Mkdir { path: String },
    /// `add <dest> <src>` — add a local file into the image.
    Add { dest: String, source: String },
    /// `fuse <mountpoint>` — expose the image as a mounted filesystem.
    Fuse { mount_point: PathBuf },
}

impl Subcommand {
    pub fn name(&self) -> &'static str {
        match self {
            Subcommand::Superblock => "sb",
            Subcommand::InodeScan => "inode",
            Subcommand::CatFirstSector { .. } => "cat1",
            Subcommand::Tree => "tree",
            Subcommand::ShaFiles => "shafiles",
            Subcommand::Bitmaps => "bm",
            Subcommand::Mkdir { .. } => "mkdir",
            Subcommand::Add { .. } => "add",
            Subcommand::Fuse { .. } => "fuse",
        }
    }

    /// Full positional argument list for one invocation against `image`.
    pub fn to_args(&self, image: &Path) -> Vec<String> {
        let mut args = vec![image.display().to_string(), self.name().to_string()];
        match self {
            Subcommand::CatFirstSector { inode } => args.push(inode.to_string()),
            Subcommand::Mkdir { path } => args.push(path.clone()),
            Subcommand::Add { dest, source } => {
                args.push(dest.clone());
                args.push(source.clone());
            }
            Subcommand::Fuse { mount_point } => args.push(mount_point.display().to_string()),
            _ => {}
        }
        args
    }
}
