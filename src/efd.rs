use crate::{Documento, EFD_CAMPO_DT_INI, EFD_REGISTRO_ABERTURA};

/// Linha da EFD Contribuições separada por `|`.
///
/// `campos[0]` é o registro (ex.: `M200`); o período é o DT_INI do registro `0000`
/// do mesmo arquivo, ou `None` se o arquivo não tiver registro de abertura.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistroEfd {
    pub campos: Vec<String>,
    pub periodo: Option<String>,
    pub arquivo_origem: String,
}

impl RegistroEfd {
    pub fn registro(&self) -> &str {
        self.campo(0).unwrap_or_default()
    }

    pub fn campo(&self, indice: usize) -> Option<&str> {
        self.campos.get(indice).map(String::as_str)
    }
}

/// Divide uma linha no separador `|`, descartando o que vem antes do primeiro separador.
///
/// Linhas que não começam com `|` não são registros e resultam em `None`.
///
/// ```
/// use cruzamento_pis_cofins::parse_linha_efd;
///
/// let campos = parse_linha_efd("|M200|1,00|2,00|").unwrap();
/// assert_eq!(campos, ["M200", "1,00", "2,00", ""]);
/// assert!(parse_linha_efd("texto livre").is_none());
/// ```
pub fn parse_linha_efd(linha: &str) -> Option<Vec<String>> {
    if !linha.starts_with('|') {
        return None;
    }

    let campos = linha
        .trim()
        .split('|')
        .skip(1)
        .map(|campo| campo.trim().to_string())
        .collect();

    Some(campos)
}

/// Registros de um arquivo da EFD Contribuições.
pub fn parse_efd(documento: &Documento) -> Vec<RegistroEfd> {
    let linhas: Vec<Vec<String>> = documento.texto.lines().filter_map(parse_linha_efd).collect();

    let periodo = linhas
        .iter()
        .find(|campos| campos.first().map(String::as_str) == Some(EFD_REGISTRO_ABERTURA))
        .and_then(|campos| campos.get(EFD_CAMPO_DT_INI).cloned());

    if periodo.is_none() {
        log::warn!(
            "EFD <{}> sem registro {EFD_REGISTRO_ABERTURA}: período não identificado.",
            documento.nome
        );
    }

    linhas
        .into_iter()
        .map(|campos| RegistroEfd {
            campos,
            periodo: periodo.clone(),
            arquivo_origem: documento.nome.clone(),
        })
        .collect()
}

/// Registros de vários arquivos, na ordem recebida.
pub fn parse_efds(documentos: &[Documento]) -> Vec<RegistroEfd> {
    documentos.iter().flat_map(parse_efd).collect()
}
