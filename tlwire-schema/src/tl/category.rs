/// Which section of a schema file a [`super::Definition`] came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Category {
    /// Data constructors, the part of the file decoders care about.
    #[default]
    Types,
    /// RPC methods listed after `---functions---`.
    Functions,
}
