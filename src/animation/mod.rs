pub(crate) mod builder;
pub(crate) mod clip;
pub(crate) mod track;
pub(crate) mod value;
