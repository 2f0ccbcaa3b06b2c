use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

const SEP: char = '/';
const CURRENT_DIR: &str = ".";
const PARENT_DIR: &str = "..";

/// An absolute path in the virtual filesystem.
///
/// A path is a sequence of segments starting at the root. Segments are never empty and are never
/// `.` or `..`; those are resolved when the path is parsed. The root is the empty sequence.
///
/// Paths in the `name` column of a SQLite archive are relative to the root of the archive, but in
/// practice they may lead with `/` or `./` depending on how the archive was created. All of these
/// parse to the same [`Path`].
///
/// Two paths are equal when their segments are equal. Whether the filesystem treats names
/// case-insensitively is a property of the tree, not the path.
///
/// ```
/// use sqlarvfs::Path;
///
/// let path = Path::new("./foo//bar/../baz");
///
/// assert_eq!(path.to_string(), "/foo/baz");
/// assert_eq!(path.base_name(), Some("baz"));
/// assert_eq!(path.parent(), Some(Path::new("/foo")));
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The root directory.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse an absolute path, or a path relative to the root.
    pub fn new(path: &str) -> Self {
        Self::root().resolve(path)
    }

    /// Resolve `relative` against this path, treating this path as a directory.
    ///
    /// If `relative` starts with a `/`, it's resolved from the root instead. A `..` at the root is
    /// ignored, the same way it is on Unix.
    pub fn resolve(&self, relative: &str) -> Self {
        let mut segments = if relative.starts_with(SEP) {
            Vec::new()
        } else {
            self.segments.clone()
        };

        for segment in relative.split(SEP) {
            match segment {
                "" | CURRENT_DIR => {}
                PARENT_DIR => {
                    segments.pop();
                }
                _ => segments.push(segment.to_owned()),
            }
        }

        Self { segments }
    }

    /// Return a new path with `name` appended as a single segment.
    ///
    /// This does not interpret `name`; it must already be a valid file name.
    pub(crate) fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Self { segments }
    }

    /// Whether this is the root directory.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The parent directory of this path, or `None` if this is the root.
    pub fn parent(&self) -> Option<Self> {
        match self.segments.split_last() {
            Some((_, parent)) => Some(Self {
                segments: parent.to_vec(),
            }),
            None => None,
        }
    }

    /// The last segment of this path, or `None` if this is the root.
    pub fn base_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// An iterator over the segments of this path, starting from the root.
    pub fn segments(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.segments.iter().map(String::as_str)
    }

    /// The number of segments in this path.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Format this path, optionally with a trailing slash.
    ///
    /// The root is always `/`, with or without `trailing_slash`.
    pub fn to_string_with(&self, trailing_slash: bool) -> String {
        let mut formatted = self.to_string();

        if trailing_slash && !self.is_root() {
            formatted.push(SEP);
        }

        formatted
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }

        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }

        Ok(())
    }
}

impl FromStr for Path {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Path {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl<'a> From<Cow<'a, str>> for Path {
    fn from(value: Cow<'a, str>) -> Self {
        Self::new(&value)
    }
}

impl From<&Path> for Path {
    fn from(value: &Path) -> Self {
        value.clone()
    }
}

impl From<Path> for String {
    fn from(path: Path) -> String {
        path.to_string()
    }
}

impl PartialEq<str> for Path {
    fn eq(&self, other: &str) -> bool {
        *self == Path::new(other)
    }
}

impl PartialEq<&str> for Path {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<String> for Path {
    fn eq(&self, other: &String) -> bool {
        self == other.as_str()
    }
}

#[cfg(test)]
mod tests {
    use xpct::{be_false, be_none, be_true, eq_diff, equal, expect};

    use super::*;

    fn segments(path: &Path) -> Vec<&str> {
        path.segments().collect()
    }

    #[test]
    fn root_variants_parse_to_root() {
        for raw in ["", ".", "/", "./", "//", "/./"] {
            expect!(Path::new(raw).is_root()).to(be_true());
        }
    }

    #[test]
    fn leading_slash_and_dot_slash_are_ignored() {
        expect!(segments(&Path::new("foo/bar"))).to(equal(vec!["foo", "bar"]));
        expect!(segments(&Path::new("/foo/bar"))).to(equal(vec!["foo", "bar"]));
        expect!(segments(&Path::new("./foo/bar"))).to(equal(vec!["foo", "bar"]));
    }

    #[test]
    fn path_coalesces_adjacent_slashes() {
        expect!(Path::new("one//two/")).to(equal(Path::new("/one/two")));
    }

    #[test]
    fn resolves_relative_paths() {
        let cases = [
            ("/", ".", vec![]),
            ("/", "foo", vec!["foo"]),
            ("/foo", ".", vec!["foo"]),
            ("/foo", "..", vec![]),
            ("/foo", "bar", vec!["foo", "bar"]),
            ("/foo", "bar/stuff", vec!["foo", "bar", "stuff"]),
            ("/foo/bar", "../things", vec!["foo", "things"]),
            ("/foo/bar", "../../blah", vec!["blah"]),
            ("/foo/bar", "../../../../../blah", vec!["blah"]),
            ("/foo/bar", "/blah", vec!["blah"]),
            ("/foo/bar", "/blah/../x", vec!["x"]),
            ("/foo/bar", "./blah", vec!["foo", "bar", "blah"]),
        ];

        for (base, relative, expected) in cases {
            expect!(segments(&Path::new(base).resolve(relative))).to(equal(expected));
        }
    }

    #[test]
    fn is_root() {
        expect!(Path::root().is_root()).to(be_true());
        expect!(Path::new("/").is_root()).to(be_true());
        expect!(Path::new("foo").is_root()).to(be_false());
    }

    #[test]
    fn parent() {
        let path = Path::new("foo/bar");

        expect!(path.parent()).to(equal(Some(Path::new("foo"))));
        expect!(Path::new("foo").parent()).to(equal(Some(Path::root())));
        expect!(Path::root().parent()).to(be_none());
    }

    #[test]
    fn base_name() {
        expect!(Path::new("foo").base_name()).to(equal(Some("foo")));
        expect!(Path::new("foo/bar/stuff").base_name()).to(equal(Some("stuff")));
        expect!(Path::root().base_name()).to(be_none());
    }

    #[test]
    fn format_with_and_without_trailing_slash() {
        expect!(Path::new("foo/bar").to_string()).to(eq_diff("/foo/bar"));
        expect!(Path::new("foo/bar").to_string_with(false)).to(eq_diff("/foo/bar"));
        expect!(Path::new("foo/bar").to_string_with(true)).to(eq_diff("/foo/bar/"));
        expect!(Path::root().to_string()).to(eq_diff("/"));
        expect!(Path::root().to_string_with(true)).to(eq_diff("/"));
    }

    #[test]
    fn normalized_paths_round_trip_through_strings() {
        for raw in ["/", "/foo", "/foo/bar baz", "/テスト/ñó. 1"] {
            let path = Path::new(raw);

            expect!(path.to_string()).to(eq_diff(raw));
            expect!(Path::new(&path.to_string())).to(equal(path));
        }
    }

    #[test]
    fn equality_ignores_leading_slash() {
        expect!(Path::new("foo")).to(equal(Path::new("/foo")));
        expect!(Path::new("foo")).to_not(equal(Path::new("bar")));
        expect!(Path::new("")).to(equal(Path::root()));
    }

    #[test]
    fn equality_is_case_sensitive() {
        expect!(Path::new("/Foo")).to_not(equal(Path::new("/foo")));
    }

    #[test]
    fn path_equals_equivalent_string() {
        expect!(Path::new("one/two")).to(equal("/one/two"));
        expect!(Path::new("one/two")).to(equal(String::from("one/two")));
    }

    #[test]
    fn appending_a_child_segment() {
        expect!(Path::new("/foo").child("bar")).to(equal(Path::new("/foo/bar")));
    }
}
