/// A named route table plus the paths dispatched against it.
#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    routes: RouteSet,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, routes: RouteSet) -> Self {
        Self { name, group, routes }
    }

    pub fn small(name: &'static str, routes: RouteSet) -> Self {
        Self::new(name, TestGroup::Small, routes)
    }

    pub fn normal(name: &'static str, routes: RouteSet) -> Self {
        Self::new(name, TestGroup::Normal, routes)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn routes(&self) -> &RouteSet {
        &self.routes
    }
}

/// Declared route patterns and concrete paths resolving to them.
#[derive(Debug, Copy, Clone)]
pub struct RouteSet {
    patterns: &'static [&'static str],
    paths: &'static [&'static str],
}

impl RouteSet {
    pub const fn new(patterns: &'static [&'static str], paths: &'static [&'static str]) -> Self {
        Self { patterns, paths }
    }

    pub fn patterns(&self) -> &'static [&'static str] {
        self.patterns
    }

    pub fn paths(&self) -> &'static [&'static str] {
        self.paths
    }
}

/// Size class of a route table, used as the benchmark id prefix.
#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
}

impl TestGroup {
    pub fn label(self) -> &'static str {
        match self {
            TestGroup::Small => "small",
            TestGroup::Normal => "normal",
        }
    }
}
