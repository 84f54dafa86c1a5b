//! Form bodies shared by the `micro-urlencoded` benchmarks.
//!
//! Every body lives under `resources/form/` and is compiled in, so a run never
//! touches the file system.

/// Rough shape of a form body, used as the criterion group of its cases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// a handful of flat fields
    Flat,
    /// bracket key paths, arrays of maps
    Nested,
    /// many flat fields, close to the default parameter limit
    Wide,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Flat => "flat",
            Shape::Nested => "nested",
            Shape::Wide => "wide",
        }
    }
}

/// One benchmark input: a named form body of a known [`Shape`].
#[derive(Clone, Copy, Debug)]
pub struct Fixture {
    name: &'static str,
    shape: Shape,
    body: &'static str,
}

impl Fixture {
    const fn new(name: &'static str, shape: Shape, body: &'static str) -> Self {
        Self { name, shape, body }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn body(&self) -> &'static [u8] {
        self.body.as_bytes()
    }

    /// Body size, reported as criterion byte throughput.
    pub fn len(&self) -> u64 {
        self.body.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// `<shape>/<name>`, the benchmark parameter of the fixture.
    pub fn id(&self) -> String {
        format!("{}/{}", self.shape.as_str(), self.name)
    }
}

pub const LOGIN: Fixture = Fixture::new("login", Shape::Flat, include_str!("../resources/form/login.txt"));
pub const USERS: Fixture = Fixture::new("users", Shape::Nested, include_str!("../resources/form/nested.txt"));
pub const FIELDS: Fixture = Fixture::new("fields", Shape::Wide, include_str!("../resources/form/wide.txt"));

/// Every fixture, smallest body first.
pub const ALL: [Fixture; 3] = [LOGIN, USERS, FIELDS];
