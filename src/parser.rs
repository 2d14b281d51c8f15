mod loader;
mod nom_parser;
mod yaml_parser;

pub use self::{
    loader::{load, load_all, load_tree},
    nom_parser::{parse_file, ParamDef, ParamSource, TreeDef, TreeRootDef, TreeSource},
    yaml_parser::load_yaml,
};
