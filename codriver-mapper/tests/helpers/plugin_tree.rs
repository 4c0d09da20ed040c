//! Plugin tree fixtures
//!
//! Writes small but complete pacenote plugin installations, target taxonomy
//! files and a project config into a temporary directory.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

/// Extra content of one plugin beyond the shared corner/detail notes
pub struct PluginContents<'a> {
    /// Additional `[PACENOTE::..]` sections for the details file
    pub extra_details: &'a str,
    /// Sound files present on disk
    pub sounds: &'a [&'a str],
}

const CORNERS: &str = "[CATEGORY::Corners]

[PACENOTE::ONE_LEFT]
id=0
Sounds=1
Snd0=one_left.ogg

[PACENOTE::ONE_RIGHT]
id=10
Sounds=1
Snd0=one_right.ogg
";

const DETAILS: &str = "[CATEGORY::Details]

[PACENOTE::INTO]
id=50
Sounds=1
Snd0=into.ogg

[PACENOTE::FINISH]
id=22
Sounds=1
Snd0=finish.ogg
";

const STRINGS: &str = "\u{feff}[STRINGS]
one_left=one left
one_right=one right
into=into
finish=finish
bridge=bridge
narrows=narrows
caution=caution
";

/// Write a plugin below `root/plugins/<name>` and return its directory
pub fn write_plugin(root: &Path, name: &str, contents: &PluginContents<'_>) -> PathBuf {
    let dir = root.join("plugins").join(name);
    write_file(&dir, "PaceNote.ini", "[SETTINGS]\nsounds=default\nlanguage=english\n");
    write_file(
        &dir,
        "config/pacenotes/Rbr.ini",
        "[PACKAGE::Standard]\nfile0=packages\\corners.ini\nfile1=packages\\details.ini\n",
    );
    write_file(&dir, "config/pacenotes/packages/corners.ini", CORNERS);
    write_file(
        &dir,
        "config/pacenotes/packages/details.ini",
        &format!("{}\n{}", DETAILS, contents.extra_details),
    );
    write_file(&dir, "config/ranges/Rbr.ini", "[PACKAGE::Ranges]\nfile0=ranges.ini\n");
    write_file(
        &dir,
        "config/ranges/ranges.ini",
        "[CATEGORY::Distances]\n\n[RANGE::100]\nSounds=1\nSnd0=100.ogg\n",
    );
    write_file(&dir, "language/english/pacenotes/strings.ini", STRINGS);
    for sound in contents.sounds {
        write_file(&dir, &format!("sounds/default/{}", sound), "");
    }
    dir
}

/// A complete project: taxonomy files, target sounds, a child codriver
/// `janne` and a base codriver `base`
pub struct Project {
    pub temp: TempDir,
    pub config_path: PathBuf,
}

impl Project {
    pub fn root(&self) -> &Path {
        self.temp.path()
    }
}

pub const TARGET_NOTES: [&str; 5] = [
    "cmp_into_number_100",
    "corner_1_left",
    "corner_1_right",
    "detail_finish",
    "detail_jump",
];

/// Write the project; `extra_config` is appended to the top-level config
/// keys, `janne_remaps` becomes the `map_rbr_ids` table of `janne`
pub fn write_project(extra_config: &str, janne_remaps: &str) -> Project {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write_file(
        root,
        "cc_pacenote_type.txt",
        "// target types\n\
         corner_1_left = 0,\n\
         corner_1_right = 10,\n\
         detail_finish = 22,\n\
         detail_into = 50,\n\
         detail_bridge = 70,\n",
    );
    write_file(root, "cc_pacenote_modifier.txt", "detail_narrows = 1024,\n");

    for note in TARGET_NOTES {
        write_file(root, &format!("targets/{}/subtitles.csv", note), "1.wav,text\n");
    }

    // janne has no finish sound
    write_plugin(
        root,
        "janne",
        &PluginContents {
            extra_details: "",
            sounds: &["one_left.ogg", "one_right.ogg", "into.ogg", "100.ogg"],
        },
    );
    write_plugin(
        root,
        "base",
        &PluginContents {
            extra_details: "[PACENOTE::BRIDGE]\nid=70\nSounds=1\nSnd0=bridge.ogg\n\n\
                            [PACENOTE::NARROWS]\nid=1024\nSounds=1\nSnd0=narrows.ogg\n\n\
                            [PACENOTE::CAUTION]\nid=9000\nSounds=1\nSnd0=caution.ogg\n",
            sounds: &[
                "one_left.ogg",
                "one_right.ogg",
                "into.ogg",
                "finish.ogg",
                "100.ogg",
                "bridge.ogg",
                "narrows.ogg",
                "caution.ogg",
            ],
        },
    );

    let config = format!(
        r#"target_sounds = "targets"
base_codriver = "base"
{extra_config}

[codrivers.base]
packages = [{{ type = "numeric", base_dir = "plugins/base", ini_files = ["Rbr.ini"] }}]

[codrivers.janne]
packages = [{{ type = "numeric", base_dir = "plugins/janne", ini_files = ["Rbr.ini"], map_rbr_ids = {{ {janne_remaps} }} }}]
"#
    );
    let config_path = write_file(root, "config.toml", &config);

    Project { temp, config_path }
}
