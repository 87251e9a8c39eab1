use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::analysis::error::ManifestParseError;
use crate::analysis::project_type::ProjectType;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Production,
    Development,
    Peer,
}

impl DependencyKind {
    pub fn label(&self) -> &'static str {
        match self {
            DependencyKind::Production => "production",
            DependencyKind::Development => "development",
            DependencyKind::Peer => "peer",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dependency {
    pub name: String,
    /// Version or range exactly as declared; never resolved.
    pub version: String,
    pub kind: DependencyKind,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>, kind: DependencyKind) -> Self {
        Dependency {
            name: name.into(),
            version: version.into(),
            kind,
        }
    }
}

/// Dependencies grouped by classification.
///
/// Repeated declarations are kept: pushing the same name twice under the same
/// kind leaves two entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DependencyGroups {
    groups: BTreeMap<DependencyKind, Vec<Dependency>>,
}

impl DependencyGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, dependency: Dependency) {
        self.groups.entry(dependency.kind).or_default().push(dependency);
    }

    pub fn extend(&mut self, other: DependencyGroups) {
        for (_, deps) in other.groups {
            for dep in deps {
                self.push(dep);
            }
        }
    }

    pub fn get(&self, kind: DependencyKind) -> &[Dependency] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (DependencyKind, &[Dependency])> {
        self.groups.iter().map(|(kind, deps)| (*kind, deps.as_slice()))
    }

    pub fn all(&self) -> impl Iterator<Item = &Dependency> {
        self.groups.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parses one ecosystem's manifests under a project root.
///
/// Missing manifests yield empty groups; unreadable or malformed ones yield a
/// [`ManifestParseError`].
pub type ExtractorFn = fn(&Path) -> Result<DependencyGroups, ManifestParseError>;

/// Dispatch table from project type to extractor.
pub fn extractor_for(project_type: ProjectType) -> Option<ExtractorFn> {
    match project_type {
        ProjectType::Node => Some(extract_npm),
        ProjectType::Php => Some(extract_composer),
        ProjectType::Python => Some(extract_pip),
        ProjectType::Go => Some(extract_go),
        ProjectType::Rust => Some(extract_cargo),
        ProjectType::Java => Some(extract_maven),
        ProjectType::Ruby => Some(extract_bundler),
        ProjectType::DotNet | ProjectType::Unknown => None,
    }
}

/// Run the extractor registered for `project_type`, if any.
pub fn extract_dependencies(
    project_type: ProjectType,
    root: &Path,
) -> Result<DependencyGroups, ManifestParseError> {
    match extractor_for(project_type) {
        Some(extract) => extract(root),
        None => Ok(DependencyGroups::new()),
    }
}

fn read_manifest(root: &Path, file_name: &str) -> Result<Option<String>, ManifestParseError> {
    let path = root.join(file_name);
    if !path.is_file() {
        return Ok(None);
    }
    std::fs::read_to_string(&path)
        .map(Some)
        .map_err(|e| ManifestParseError::new(file_name, e))
}

/// JSON object entries in declaration order, duplicates included.
#[derive(Debug, Default)]
struct DeclaredEntries(Vec<(String, serde_json::Value)>);

impl<'de> Deserialize<'de> for DeclaredEntries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = DeclaredEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object of package names to versions")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((name, version)) = map.next_entry::<String, serde_json::Value>()? {
                    entries.push((name, version));
                }
                Ok(DeclaredEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

fn push_entries(groups: &mut DependencyGroups, entries: Option<DeclaredEntries>, kind: DependencyKind) {
    for (name, version) in entries.unwrap_or_default().0 {
        let version = version.as_str().unwrap_or("unknown").to_string();
        groups.push(Dependency::new(name, version, kind));
    }
}

// A section may be absent or `null`; both read as empty.
#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: Option<DeclaredEntries>,
    #[serde(default, rename = "optionalDependencies")]
    optional_dependencies: Option<DeclaredEntries>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: Option<DeclaredEntries>,
    #[serde(default, rename = "peerDependencies")]
    peer_dependencies: Option<DeclaredEntries>,
}

/// `package.json`
pub fn extract_npm(root: &Path) -> Result<DependencyGroups, ManifestParseError> {
    let Some(content) = read_manifest(root, "package.json")? else {
        return Ok(DependencyGroups::new());
    };
    let manifest: PackageJson =
        serde_json::from_str(&content).map_err(|e| ManifestParseError::new("package.json", e))?;

    let mut groups = DependencyGroups::new();
    push_entries(&mut groups, manifest.dependencies, DependencyKind::Production);
    push_entries(&mut groups, manifest.optional_dependencies, DependencyKind::Production);
    push_entries(&mut groups, manifest.dev_dependencies, DependencyKind::Development);
    push_entries(&mut groups, manifest.peer_dependencies, DependencyKind::Peer);
    Ok(groups)
}

#[derive(Deserialize)]
struct ComposerJson {
    #[serde(default)]
    require: Option<DeclaredEntries>,
    #[serde(default, rename = "require-dev")]
    require_dev: Option<DeclaredEntries>,
}

/// `composer.json`
pub fn extract_composer(root: &Path) -> Result<DependencyGroups, ManifestParseError> {
    let Some(content) = read_manifest(root, "composer.json")? else {
        return Ok(DependencyGroups::new());
    };
    let manifest: ComposerJson =
        serde_json::from_str(&content).map_err(|e| ManifestParseError::new("composer.json", e))?;

    let mut groups = DependencyGroups::new();
    push_entries(&mut groups, manifest.require, DependencyKind::Production);
    push_entries(&mut groups, manifest.require_dev, DependencyKind::Development);
    Ok(groups)
}

/// `requirements.txt` and `requirements-dev.txt`
pub fn extract_pip(root: &Path) -> Result<DependencyGroups, ManifestParseError> {
    let mut groups = DependencyGroups::new();

    for (file_name, kind) in [
        ("requirements.txt", DependencyKind::Production),
        ("requirements-dev.txt", DependencyKind::Development),
    ] {
        if let Some(content) = read_manifest(root, file_name)? {
            for line in content.lines() {
                if let Some((name, version)) = parse_requirement(line) {
                    groups.push(Dependency::new(name, version, kind));
                }
            }
        }
    }

    Ok(groups)
}

/// Split a requirement line such as `flask==2.3.0` or `requests[socks]>=2.28`.
fn parse_requirement(line: &str) -> Option<(String, String)> {
    let line = line.split('#').next().unwrap_or("");
    let line = line.split(';').next().unwrap_or("").trim();
    // options (-r, -e, --index-url) and bare urls are not package pins
    if line.is_empty() || line.starts_with('-') || line.contains("://") {
        return None;
    }

    let spec: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    let split_at = spec.find(|c: char| matches!(c, '=' | '<' | '>' | '~' | '!'));
    let (name, version) = match split_at {
        Some(idx) => {
            let constraint = &spec[idx..];
            let version = match constraint.strip_prefix("==") {
                Some(exact) => exact.to_string(),
                None => constraint.to_string(),
            };
            (&spec[..idx], version)
        }
        None => (spec.as_str(), "*".to_string()),
    };
    let name = name.split('[').next().unwrap_or(name);

    if name.is_empty() {
        None
    } else {
        Some((name.to_string(), version))
    }
}

/// `go.mod`
pub fn extract_go(root: &Path) -> Result<DependencyGroups, ManifestParseError> {
    let Some(content) = read_manifest(root, "go.mod")? else {
        return Ok(DependencyGroups::new());
    };

    let mut groups = DependencyGroups::new();
    let mut has_module = false;
    let mut in_require = false;
    let mut in_other_block = false;

    for raw in content.lines() {
        let line = raw.split("//").next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if in_require || in_other_block {
            if line == ")" {
                in_require = false;
                in_other_block = false;
            } else if in_require {
                push_go_requirement(&mut groups, line);
            }
            continue;
        }

        if line.starts_with("module ") {
            has_module = true;
        } else if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest == "(" {
                in_require = true;
            } else {
                push_go_requirement(&mut groups, rest);
            }
        } else if line.ends_with('(') {
            // replace / exclude / retract blocks
            in_other_block = true;
        }
    }

    if !has_module {
        return Err(ManifestParseError::new("go.mod", "missing module directive"));
    }
    Ok(groups)
}

fn push_go_requirement(groups: &mut DependencyGroups, spec: &str) {
    let mut parts = spec.split_whitespace();
    if let Some(name) = parts.next() {
        let version = parts.next().unwrap_or("latest");
        groups.push(Dependency::new(name, version, DependencyKind::Production));
    }
}

/// `Cargo.toml`
pub fn extract_cargo(root: &Path) -> Result<DependencyGroups, ManifestParseError> {
    let Some(content) = read_manifest(root, "Cargo.toml")? else {
        return Ok(DependencyGroups::new());
    };
    let manifest: toml::Value =
        toml::from_str(&content).map_err(|e| ManifestParseError::new("Cargo.toml", e))?;

    let mut groups = DependencyGroups::new();
    for (section, kind) in [
        ("dependencies", DependencyKind::Production),
        ("dev-dependencies", DependencyKind::Development),
        ("build-dependencies", DependencyKind::Development),
    ] {
        let Some(table) = manifest.get(section).and_then(|v| v.as_table()) else {
            continue;
        };
        for (name, value) in table {
            let version = if let Some(version) = value.as_str() {
                version.to_string()
            } else if let Some(spec) = value.as_table() {
                if let Some(version) = spec.get("version").and_then(|v| v.as_str()) {
                    version.to_string()
                } else if spec.get("workspace").and_then(|v| v.as_bool()) == Some(true) {
                    "workspace".to_string()
                } else {
                    "unknown".to_string()
                }
            } else {
                "unknown".to_string()
            };
            groups.push(Dependency::new(name.clone(), version, kind));
        }
    }

    Ok(groups)
}

/// `pom.xml`
///
/// `groupId:artifactId` becomes the name and `<scope>` picks the classification.
/// Only project and profile dependencies count; plugin dependencies and
/// `<dependencyManagement>` entries are not dependencies of the project.
pub fn extract_maven(root: &Path) -> Result<DependencyGroups, ManifestParseError> {
    let Some(content) = read_manifest(root, "pom.xml")? else {
        return Ok(DependencyGroups::new());
    };

    let mut reader = Reader::from_str(&content);
    let mut groups = DependencyGroups::new();
    let mut path: Vec<String> = Vec::new();
    let mut saw_project = false;
    let mut current: Option<MavenCoordinate> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if path.is_empty() {
                    if name != "project" {
                        return Err(ManifestParseError::new("pom.xml", "missing <project> element"));
                    }
                    saw_project = true;
                }
                path.push(name);
                if is_project_dependency(&path) {
                    current = Some(MavenCoordinate::default());
                }
            }
            Ok(Event::End(_)) => {
                if is_project_dependency(&path) {
                    if let Some(coordinate) = current.take() {
                        if let Some(dependency) = coordinate.into_dependency() {
                            groups.push(dependency);
                        }
                    }
                }
                path.pop();
            }
            Ok(Event::Text(t)) => {
                if let (Some(coordinate), Some(tag)) = (current.as_mut(), path.last()) {
                    if path.len() >= 2 && is_project_dependency(&path[..path.len() - 1]) {
                        let text = t
                            .unescape()
                            .map_err(|e| ManifestParseError::new("pom.xml", e))?
                            .trim()
                            .to_string();
                        coordinate.set(tag, text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ManifestParseError::new(
                    "pom.xml",
                    format!("XML error at position {}: {}", reader.buffer_position(), e),
                ));
            }
            _ => {}
        }
    }

    if !saw_project {
        return Err(ManifestParseError::new("pom.xml", "missing <project> element"));
    }
    if !path.is_empty() {
        return Err(ManifestParseError::new(
            "pom.xml",
            format!("unexpected end of document inside <{}>", path.join("><")),
        ));
    }
    Ok(groups)
}

#[derive(Debug, Default)]
struct MavenCoordinate {
    group_id: String,
    artifact_id: String,
    version: String,
    scope: String,
}

impl MavenCoordinate {
    fn set(&mut self, tag: &str, value: String) {
        match tag {
            "groupId" => self.group_id = value,
            "artifactId" => self.artifact_id = value,
            "version" => self.version = value,
            "scope" => self.scope = value,
            _ => {}
        }
    }

    fn into_dependency(self) -> Option<Dependency> {
        if self.artifact_id.is_empty() {
            return None;
        }
        let name = if self.group_id.is_empty() {
            self.artifact_id
        } else {
            format!("{}:{}", self.group_id, self.artifact_id)
        };
        let kind = match self.scope.as_str() {
            "test" => DependencyKind::Development,
            "provided" => DependencyKind::Peer,
            _ => DependencyKind::Production,
        };
        let version = if self.version.is_empty() { "unknown".to_string() } else { self.version };
        Some(Dependency::new(name, version, kind))
    }
}

/// `.../dependencies/dependency`, outside plugins and dependency management.
fn is_project_dependency(path: &[String]) -> bool {
    let n = path.len();
    n >= 2
        && path[n - 1] == "dependency"
        && path[n - 2] == "dependencies"
        && !path
            .iter()
            .any(|p| p == "plugin" || p == "dependencyManagement")
}

static GEM_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^gem\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#).expect("valid gem regex")
});

/// `Gemfile`
pub fn extract_bundler(root: &Path) -> Result<DependencyGroups, ManifestParseError> {
    let Some(content) = read_manifest(root, "Gemfile")? else {
        return Ok(DependencyGroups::new());
    };

    let mut groups = DependencyGroups::new();
    // one flag per open `do` block: whether it is a development/test group
    let mut blocks: Vec<bool> = Vec::new();

    for raw in content.lines() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        if line == "end" || line.starts_with("end ") || line.starts_with("end.") {
            blocks.pop();
            continue;
        }
        if line.ends_with(" do") || line.contains(" do |") {
            let dev = line.starts_with("group")
                && (line.contains(":development") || line.contains(":test"));
            blocks.push(dev);
            continue;
        }
        if opens_ruby_block(line) {
            blocks.push(false);
            continue;
        }

        if let Some(caps) = GEM_LINE.captures(line) {
            let name = &caps[1];
            let version = caps.get(2).map(|m| m.as_str()).unwrap_or("*");
            let dev_inline = line.contains("group: :development") || line.contains("group: :test");
            let kind = if dev_inline || blocks.iter().any(|dev| *dev) {
                DependencyKind::Development
            } else {
                DependencyKind::Production
            };
            groups.push(Dependency::new(name, version, kind));
        }
    }

    Ok(groups)
}

/// Statement-form conditionals and loops that are closed by their own `end`.
fn opens_ruby_block(line: &str) -> bool {
    let keyword = line
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("");
    let opener = matches!(keyword, "if" | "unless" | "case" | "begin" | "while" | "until");
    opener && !line.ends_with(" end") && !line.ends_with(";end")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_extract_npm() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), r#"{
            "name": "test",
            "dependencies": {
                "express": "^4.18.0",
                "lodash": "4.17.21"
            },
            "devDependencies": {
                "jest": "^29.0.0"
            },
            "peerDependencies": {
                "react": ">=17"
            }
        }"#).unwrap();

        let groups = extract_npm(temp_dir.path()).unwrap();

        assert_eq!(groups.get(DependencyKind::Production).len(), 2);
        assert_eq!(groups.get(DependencyKind::Development)[0].name, "jest");
        assert_eq!(groups.get(DependencyKind::Peer)[0].version, ">=17");
    }

    #[test]
    fn test_npm_duplicate_names_are_kept() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("package.json"),
            r#"{"dependencies": {"left-pad": "1.0.0", "left-pad": "1.1.0"}}"#,
        ).unwrap();

        let groups = extract_npm(temp_dir.path()).unwrap();
        let prod = groups.get(DependencyKind::Production);

        assert_eq!(prod.len(), 2);
        assert_eq!(prod[0].version, "1.0.0");
        assert_eq!(prod[1].version, "1.1.0");
    }

    #[test]
    fn test_npm_malformed_manifest() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), "{ not json").unwrap();

        let err = extract_npm(temp_dir.path()).unwrap_err();
        assert_eq!(err.manifest, "package.json");
    }

    #[test]
    fn test_npm_wrong_section_type_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), r#"{"dependencies": ["a"]}"#).unwrap();

        assert!(extract_npm(temp_dir.path()).is_err());
    }

    #[test]
    fn test_missing_manifest_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        assert!(extract_npm(temp_dir.path()).unwrap().is_empty());
        assert!(extract_composer(temp_dir.path()).unwrap().is_empty());
        assert!(extract_go(temp_dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_extract_composer() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("composer.json"), r#"{
            "require": {"php": "^8.1", "laravel/framework": "^10.0"},
            "require-dev": {"phpunit/phpunit": "^10.1"}
        }"#).unwrap();

        let groups = extract_composer(temp_dir.path()).unwrap();

        assert_eq!(groups.get(DependencyKind::Production).len(), 2);
        assert_eq!(groups.get(DependencyKind::Development)[0].name, "phpunit/phpunit");
        assert!(groups.get(DependencyKind::Peer).is_empty());
    }

    #[test]
    fn test_parse_requirement() {
        assert_eq!(parse_requirement("flask==2.3.0"), Some(("flask".into(), "2.3.0".into())));
        assert_eq!(
            parse_requirement("requests[socks] >= 2.28 ; python_version > '3'"),
            Some(("requests".into(), ">=2.28".into()))
        );
        assert_eq!(parse_requirement("numpy"), Some(("numpy".into(), "*".into())));
        assert_eq!(parse_requirement("# comment"), None);
        assert_eq!(parse_requirement("-r base.txt"), None);
    }

    #[test]
    fn test_extract_pip_reads_dev_requirements() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("requirements.txt"), "django==4.2\ncelery>=5\n").unwrap();
        fs::write(temp_dir.path().join("requirements-dev.txt"), "pytest\n").unwrap();

        let groups = extract_pip(temp_dir.path()).unwrap();

        assert_eq!(groups.get(DependencyKind::Production).len(), 2);
        assert_eq!(groups.get(DependencyKind::Development)[0].name, "pytest");
    }

    #[test]
    fn test_extract_go() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("go.mod"), r#"
module github.com/example/test

go 1.21

require github.com/google/uuid v1.4.0

require (
    github.com/gin-gonic/gin v1.9.1
    golang.org/x/net v0.17.0 // indirect
)

replace (
    golang.org/x/net => ../net
)
"#).unwrap();

        let groups = extract_go(temp_dir.path()).unwrap();
        let prod = groups.get(DependencyKind::Production);

        assert_eq!(prod.len(), 3);
        assert_eq!(prod[0].name, "github.com/google/uuid");
        assert_eq!(prod[2].version, "v0.17.0");
    }

    #[test]
    fn test_extract_go_without_module_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("go.mod"), "require x v1\n").unwrap();
        assert!(extract_go(temp_dir.path()).is_err());
    }

    #[test]
    fn test_extract_cargo() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Cargo.toml"), r#"
[package]
name = "test"

[dependencies]
serde = "1.0"
tokio = { version = "1.0", features = ["full"] }
local = { path = "../local" }

[dev-dependencies]
tempfile = "3"

[build-dependencies]
cc = "1.0"
        "#).unwrap();

        let groups = extract_cargo(temp_dir.path()).unwrap();
        let prod = groups.get(DependencyKind::Production);

        assert_eq!(prod.len(), 3);
        assert!(prod.iter().any(|d| d.name == "tokio" && d.version == "1.0"));
        assert!(prod.iter().any(|d| d.name == "local" && d.version == "unknown"));
        assert_eq!(groups.get(DependencyKind::Development).len(), 2);
    }

    #[test]
    fn test_extract_maven_scopes() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("pom.xml"), r#"<project>
  <dependencies>
    <dependency>
      <groupId>org.springframework</groupId>
      <artifactId>spring-core</artifactId>
      <version>6.0.0</version>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>4.13</version>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>javax.servlet</groupId>
      <artifactId>servlet-api</artifactId>
      <scope>provided</scope>
    </dependency>
  </dependencies>
</project>"#).unwrap();

        let groups = extract_maven(temp_dir.path()).unwrap();

        assert_eq!(groups.get(DependencyKind::Production)[0].name, "org.springframework:spring-core");
        assert_eq!(groups.get(DependencyKind::Development)[0].version, "4.13");
        assert_eq!(groups.get(DependencyKind::Peer)[0].version, "unknown");
    }

    #[test]
    fn test_extract_bundler_groups() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Gemfile"), r#"
source "https://rubygems.org"

gem "rails", "~> 7.0"
gem 'pg'

group :development, :test do
  gem "rspec-rails"
end

gem "rubocop", group: :development
"#).unwrap();

        let groups = extract_bundler(temp_dir.path()).unwrap();
        let prod = groups.get(DependencyKind::Production);
        let dev = groups.get(DependencyKind::Development);

        assert_eq!(prod.len(), 2);
        assert_eq!(prod[0].version, "~> 7.0");
        assert_eq!(prod[1].version, "*");
        assert_eq!(dev.len(), 2);
    }

    #[test]
    fn test_extract_maven_compact_pom() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("pom.xml"),
            "<project><dependencies>\n<dependency><groupId>junit</groupId><artifactId>junit</artifactId><version>4.13</version></dependency>\n</dependencies></project>",
        ).unwrap();

        let groups = extract_maven(temp_dir.path()).unwrap();
        let prod = groups.get(DependencyKind::Production);

        assert_eq!(prod.len(), 1);
        assert_eq!(prod[0].name, "junit:junit");
        assert_eq!(prod[0].version, "4.13");
    }

    #[test]
    fn test_extract_maven_skips_plugin_and_managed_dependencies() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("pom.xml"), r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <dependencyManagement><dependencies>
    <dependency><groupId>com.example</groupId><artifactId>bom</artifactId><version>1</version></dependency>
  </dependencies></dependencyManagement>
  <dependencies>
    <!-- logging -->
    <dependency><groupId>org.slf4j</groupId><artifactId>slf4j-api</artifactId><version>2.0.9</version></dependency>
  </dependencies>
  <build><plugins><plugin>
    <artifactId>maven-compiler-plugin</artifactId>
    <dependencies>
      <dependency><groupId>org.ow2.asm</groupId><artifactId>asm</artifactId><version>9.5</version></dependency>
    </dependencies>
  </plugin></plugins></build>
</project>"#).unwrap();

        let groups = extract_maven(temp_dir.path()).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups.get(DependencyKind::Production)[0].name, "org.slf4j:slf4j-api");
    }

    #[test]
    fn test_extract_maven_malformed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("pom.xml"), "<project><dependencies></project>").unwrap();
        assert!(extract_maven(temp_dir.path()).is_err());

        fs::write(temp_dir.path().join("pom.xml"), "<settings></settings>").unwrap();
        let err = extract_maven(temp_dir.path()).unwrap_err();
        assert_eq!(err.manifest, "pom.xml");

        fs::write(temp_dir.path().join("pom.xml"), "<project><dependencies>").unwrap();
        assert!(extract_maven(temp_dir.path()).is_err());
    }

    #[test]
    fn test_extract_bundler_nested_conditional_keeps_group() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("Gemfile"), r#"
group :development do
  if ENV['WITH_DEBUGGER']
    gem 'debug'
  end
  gem 'pry'
end

gem 'puma'
gem 'listen' if RUBY_PLATFORM =~ /linux/
"#).unwrap();

        let groups = extract_bundler(temp_dir.path()).unwrap();
        let dev: Vec<&str> = groups
            .get(DependencyKind::Development)
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        let prod: Vec<&str> = groups
            .get(DependencyKind::Production)
            .iter()
            .map(|d| d.name.as_str())
            .collect();

        assert_eq!(dev, vec!["debug", "pry"]);
        assert_eq!(prod, vec!["puma", "listen"]);
    }

    #[test]
    fn test_npm_null_section_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("package.json"),
            r#"{"dependencies": {"express": "^4.18.0"}, "peerDependencies": null}"#,
        ).unwrap();

        let groups = extract_npm(temp_dir.path()).unwrap();

        assert_eq!(groups.get(DependencyKind::Production)[0].name, "express");
        assert!(groups.get(DependencyKind::Peer).is_empty());
    }

    #[test]
    fn test_dispatch_table() {
        assert!(extractor_for(ProjectType::Node).is_some());
        assert!(extractor_for(ProjectType::DotNet).is_none());

        let temp_dir = TempDir::new().unwrap();
        let groups = extract_dependencies(ProjectType::Unknown, temp_dir.path()).unwrap();
        assert!(groups.is_empty());
    }
}
