mod args;
mod darf;
mod dctf;
mod efd;
mod error;
mod fontes;
mod layouts;
mod logger;
mod metadata;
mod normalizar;
mod perdcomp;
mod regex;
mod registro;
mod relatorio;
mod resumo;

pub use self::{
    args::*, darf::*, dctf::*, efd::*, error::*, fontes::*, layouts::*, logger::*, metadata::*,
    normalizar::*, perdcomp::*, regex::*, registro::*, relatorio::*, resumo::*,
};
