use crate::{
    DCTF_LARGURA_TIPO, DCTF_REGISTRO_DEBITO, Documento, LAYOUTS_DCTF, Registro, Tabelas,
    gerar_tabelas,
};

/// Tabelas da DCTF: uma por tipo de registro declarado em [`LAYOUTS_DCTF`].
pub type TabelasDctf = Tabelas;

pub fn gerar_tabelas_dctf(documentos: &[Documento]) -> TabelasDctf {
    gerar_tabelas(documentos, LAYOUTS_DCTF, DCTF_LARGURA_TIPO)
}

/// Registros de débito apurado (`Tipo == R10`) de todas as tabelas.
pub fn debitos_dctf(tabelas: &TabelasDctf) -> impl Iterator<Item = &Registro> {
    tabelas
        .values()
        .flat_map(|tabela| tabela.registros.iter())
        .filter(|registro| registro.get("Tipo") == DCTF_REGISTRO_DEBITO)
}

pub fn total_de_registros(tabelas: &TabelasDctf) -> usize {
    tabelas.values().map(|tabela| tabela.len()).sum()
}
