//! Homebrew formula generation.
//!
//! Generates Ruby formula files for Homebrew from release artifacts.

use crate::error::{Error, Result};
use ranked_searcher_release::{ChecksumsManifest, ReleaseConfig, Target};
use std::collections::BTreeMap;

/// Binary information for a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryInfo {
    /// Download URL
    pub url: String,
    /// SHA256 checksum
    pub sha256: String,
}

/// Data for generating a Homebrew formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaData {
    /// Formula class name (e.g., "RankedSearcher")
    pub class_name: String,
    /// Description
    pub desc: String,
    /// Homepage URL
    pub homepage: String,
    /// Version
    pub version: String,
    /// License identifier, if the formula declares one
    pub license: Option<String>,
    /// Executable copied into `bin`
    pub binary_name: String,
    /// Arguments the test block passes to the installed executable
    pub test_args: Vec<String>,
    /// Binary info per target
    pub binaries: BTreeMap<Target, BinaryInfo>,
}

impl FormulaData {
    /// Builds formula data for a release from the project config and the
    /// release checksums.
    ///
    /// # Errors
    ///
    /// Returns an error if the config names an unknown target or a target's
    /// archive has no entry in `checksums`.
    pub fn from_config(
        config: &ReleaseConfig,
        version: &str,
        checksums: &ChecksumsManifest,
    ) -> Result<Self> {
        let mut binaries = BTreeMap::new();
        for target in config.targets()? {
            let archive = config.archive_name(version, target);
            let sha256 = checksums.get(&archive).ok_or_else(|| {
                Error::template(format!("no checksum for {archive} ({target})"))
            })?;
            binaries.insert(
                target,
                BinaryInfo {
                    url: config.download_url(version, target),
                    sha256: sha256.to_string(),
                },
            );
        }

        Ok(Self {
            class_name: config.class_name(),
            desc: config.project.desc.clone(),
            homepage: config.project.homepage.clone(),
            version: version.to_string(),
            license: config.project.license.clone(),
            binary_name: config.binary_name().to_string(),
            test_args: config.formula.test_args.clone(),
            binaries,
        })
    }
}

/// Homebrew formula generator.
pub struct FormulaGenerator;

impl FormulaGenerator {
    /// Generates a Ruby formula from the data.
    ///
    /// OS blocks are emitted only for operating systems that have at least one
    /// binary; within a block `on_intel` precedes `on_arm`.
    #[must_use]
    #[allow(clippy::format_push_string)]
    pub fn generate(data: &FormulaData) -> String {
        let mut formula = format!(
            "class {} < Formula\n  desc {}\n  homepage {}\n  version {}\n",
            data.class_name,
            ruby_string(&data.desc),
            ruby_string(&data.homepage),
            ruby_string(&data.version),
        );
        if let Some(license) = &data.license {
            formula.push_str(&format!("  license {}\n", ruby_string(license)));
        }

        for os_block in ["on_macos", "on_linux"] {
            let blocks: Vec<String> = data
                .binaries
                .iter()
                .filter(|(target, _)| target.os_block() == os_block)
                .map(|(target, info)| {
                    format!(
                        "    {} do\n      url {}\n      sha256 {}\n    end\n",
                        target.arch_block(),
                        ruby_string(&info.url),
                        ruby_string(&info.sha256)
                    )
                })
                .collect();
            if blocks.is_empty() {
                continue;
            }
            formula.push_str(&format!("\n  {os_block} do\n"));
            formula.push_str(&blocks.join("\n"));
            formula.push_str("  end\n");
        }

        let binary = &data.binary_name;
        formula.push_str("\n  def install\n");
        formula.push_str(&format!("    bin.install {}\n", ruby_string(binary)));
        formula.push_str("  end\n\n");
        formula.push_str("  test do\n");
        // Ruby string interpolation: #{bin} - we need literal #{ in the output
        let mut command = vec![format!("\"#{{bin}}/{}\"", escape_ruby(binary))];
        command.extend(data.test_args.iter().map(|arg| ruby_string(arg)));
        formula.push_str(&format!("    system {}\n", command.join(", ")));
        formula.push_str("  end\nend\n");

        formula
    }
}

/// Quotes a value as a Ruby double-quoted string literal.
#[must_use]
pub fn ruby_string(value: &str) -> String {
    format!("\"{}\"", escape_ruby(value))
}

fn escape_ruby(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '#' if chars.peek() == Some(&'{') => out.push_str("\\#"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_with(binaries: BTreeMap<Target, BinaryInfo>) -> FormulaData {
        FormulaData {
            class_name: "RankedSearcher".to_string(),
            desc: "Search inside text files".to_string(),
            homepage: "https://github.com/larscom/ranked-searcher".to_string(),
            version: "0.0.2".to_string(),
            license: None,
            binary_name: "ranked-searcher".to_string(),
            test_args: vec!["test".to_string()],
            binaries,
        }
    }

    fn info(url: &str, sha256: &str) -> BinaryInfo {
        BinaryInfo {
            url: url.to_string(),
            sha256: sha256.to_string(),
        }
    }

    #[test]
    fn test_generate_formula_macos_only() {
        let mut binaries = BTreeMap::new();
        binaries.insert(Target::MacosArm, info("https://example.com/arm.tar.gz", "armhash"));
        binaries.insert(Target::MacosIntel, info("https://example.com/x86.tar.gz", "x86hash"));

        let formula = FormulaGenerator::generate(&data_with(binaries));

        let expected = r##"class RankedSearcher < Formula
  desc "Search inside text files"
  homepage "https://github.com/larscom/ranked-searcher"
  version "0.0.2"

  on_macos do
    on_intel do
      url "https://example.com/x86.tar.gz"
      sha256 "x86hash"
    end

    on_arm do
      url "https://example.com/arm.tar.gz"
      sha256 "armhash"
    end
  end

  def install
    bin.install "ranked-searcher"
  end

  test do
    system "#{bin}/ranked-searcher", "test"
  end
end
"##;
        assert_eq!(formula, expected);
    }

    #[test]
    fn test_generate_formula_all_platforms() {
        let mut binaries = BTreeMap::new();
        binaries.insert(Target::LinuxIntel, info("https://example.com/linux.tar.gz", "linux_hash"));
        binaries.insert(Target::MacosArm, info("https://example.com/arm.tar.gz", "arm_hash"));
        binaries.insert(Target::MacosIntel, info("https://example.com/x86.tar.gz", "x86_hash"));

        let formula = FormulaGenerator::generate(&data_with(binaries));
        let macos = formula.find("on_macos do").unwrap();
        let linux = formula.find("on_linux do").unwrap();
        assert!(macos < linux);
        assert!(formula.find("x86_hash").unwrap() < formula.find("arm_hash").unwrap());
        assert!(formula.contains("  on_linux do\n    on_intel do\n"));
    }

    #[test]
    fn test_generate_formula_with_license() {
        let mut data = data_with(BTreeMap::new());
        data.license = Some("MIT".to_string());
        let formula = FormulaGenerator::generate(&data);
        assert!(formula.contains("  version \"0.0.2\"\n  license \"MIT\"\n"));
    }

    #[test]
    fn test_generate_formula_empty_binaries() {
        let formula = FormulaGenerator::generate(&data_with(BTreeMap::new()));
        // Should still generate valid structure even with no binaries
        assert!(formula.contains("class RankedSearcher < Formula"));
        assert!(!formula.contains("on_macos do"));
        assert!(!formula.contains("on_linux do"));
        assert!(formula.ends_with("end\n"));
    }

    #[test]
    fn test_generate_formula_test_section() {
        let mut data = data_with(BTreeMap::new());
        data.test_args = vec!["--version".to_string(), "-q".to_string()];
        let formula = FormulaGenerator::generate(&data);
        assert!(formula.contains("    system \"#{bin}/ranked-searcher\", \"--version\", \"-q\"\n"));
    }

    #[test]
    fn test_formula_special_characters_in_desc() {
        let mut data = data_with(BTreeMap::new());
        data.desc = r#"Say "hi" to #{ruby} and \ paths"#.to_string();
        let formula = FormulaGenerator::generate(&data);
        assert!(formula.contains(r#"desc "Say \"hi\" to \#{ruby} and \\ paths""#));
    }

    #[test]
    fn test_from_config() {
        let config = ReleaseConfig::default();
        let mut checksums = ChecksumsManifest::new();
        for target in Target::all() {
            checksums.add(
                config.archive_name("0.0.2", *target),
                format!("{:064x}", *target as u8 + 1),
            );
        }

        let data = FormulaData::from_config(&config, "0.0.2", &checksums).unwrap();
        assert_eq!(data.class_name, "RankedSearcher");
        assert_eq!(data.binaries.len(), 3);
        assert_eq!(
            data.binaries[&Target::LinuxIntel].url,
            "https://github.com/larscom/ranked-searcher/releases/download/0.0.2/ranked-searcher-0.0.2-linux-x86_64.tar.gz"
        );
        assert_eq!(data.binaries[&Target::MacosIntel].sha256, format!("{:064x}", 1));
    }

    #[test]
    fn test_from_config_missing_checksum() {
        let config = ReleaseConfig::default();
        let err = FormulaData::from_config(&config, "0.0.2", &ChecksumsManifest::new()).unwrap_err();
        assert!(err.to_string().contains("ranked-searcher-0.0.2-macos-x86_64.tar.gz"));
    }
}
