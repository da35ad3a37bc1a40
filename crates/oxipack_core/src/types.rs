#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub request: String,
    pub kind: SpecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    /// `import ... from` or `require()`
    Static,
    /// `import()`
    Dynamic,
    /// `export ... from` and `export * from`
    ReExport,
}
