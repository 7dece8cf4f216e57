use std::collections::BTreeMap;

use crate::{COLUNA_ARQUIVO_ORIGEM, Campo, Layout};

/// Conteúdo textual de um arquivo de entrada já decodificado.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Documento {
    pub nome: String,
    pub texto: String,
}

impl Documento {
    pub fn new(nome: impl Into<String>, texto: impl Into<String>) -> Self {
        Documento {
            nome: nome.into(),
            texto: texto.into(),
        }
    }
}

/// Campos de um registro: nome do campo -> valor sem espaços nas extremidades.
pub type Campos = BTreeMap<&'static str, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Registro {
    pub tipo: &'static str,
    pub campos: Campos,
    pub arquivo_origem: String,
}

impl Registro {
    /// Valor de uma coluna; campos ausentes são lidos como string vazia.
    pub fn get(&self, coluna: &str) -> &str {
        if coluna == COLUNA_ARQUIVO_ORIGEM {
            return &self.arquivo_origem;
        }
        self.campos.get(coluna).map(String::as_str).unwrap_or_default()
    }
}

/// Todos os registros de um mesmo tipo.
#[derive(Debug, Clone, PartialEq)]
pub struct Tabela {
    pub tipo: &'static str,
    pub colunas: Vec<&'static str>,
    pub registros: Vec<Registro>,
}

impl Tabela {
    /// Tabela sem linhas, mas com todas as colunas do leiaute.
    pub fn vazia(tipo: &'static str, layout: Layout) -> Self {
        let colunas = layout
            .iter()
            .map(|campo| campo.nome)
            .chain([COLUNA_ARQUIVO_ORIGEM])
            .collect();

        Tabela {
            tipo,
            colunas,
            registros: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.registros.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registros.is_empty()
    }
}

/// Tabelas indexadas pelo tipo de registro.
pub type Tabelas = BTreeMap<&'static str, Tabela>;

/// Recorta os campos de uma linha conforme o leiaute.
///
/// As posições são contadas em caracteres (base 1, inclusivas).
/// Posições além do fim da linha resultam em valores truncados ou vazios.
///
/// ```
/// use cruzamento_pis_cofins::{Campo, parse_registro};
///
/// let layout = [
///     Campo { nome: "A", inicio: 1, fim: 3 },
///     Campo { nome: "B", inicio: 4, fim: 6 },
/// ];
/// let campos = parse_registro("abcdef", &layout);
/// assert_eq!(campos["A"], "abc");
/// assert_eq!(campos["B"], "def");
/// ```
pub fn parse_registro(linha: &str, layout: &[Campo]) -> Campos {
    let caracteres: Vec<char> = linha.chars().collect();

    layout
        .iter()
        .map(|campo| (campo.nome, fatiar(&caracteres, campo.inicio, campo.fim)))
        .collect()
}

fn fatiar(caracteres: &[char], inicio: usize, fim: usize) -> String {
    let inicio = inicio.saturating_sub(1).min(caracteres.len());
    let fim = fim.min(caracteres.len()).max(inicio);

    caracteres[inicio..fim]
        .iter()
        .collect::<String>()
        .trim()
        .to_string()
}

/// Identificação do tipo de registro: os primeiros `largura` caracteres, sem espaços.
pub fn tipo_da_linha(linha: &str, largura: usize) -> String {
    linha.chars().take(largura).collect::<String>().trim().to_string()
}

/// Agrupa as linhas dos documentos por tipo de registro.
///
/// Linhas de tipos sem leiaute são descartadas. Todo tipo declarado em `layouts`
/// aparece no resultado, mesmo sem nenhuma linha correspondente.
pub fn gerar_tabelas(
    documentos: &[Documento],
    layouts: &[(&'static str, Layout)],
    largura_tipo: usize,
) -> Tabelas {
    let mut tabelas: Tabelas = layouts
        .iter()
        .map(|&(tipo, layout)| (tipo, Tabela::vazia(tipo, layout)))
        .collect();

    for documento in documentos {
        for linha in documento.texto.lines() {
            let tipo = tipo_da_linha(linha, largura_tipo);

            let Some(&(tipo, layout)) = layouts.iter().find(|(t, _)| *t == tipo) else {
                continue;
            };

            if let Some(tabela) = tabelas.get_mut(tipo) {
                tabela.registros.push(Registro {
                    tipo,
                    campos: parse_registro(linha, layout),
                    arquivo_origem: documento.nome.clone(),
                });
            }
        }
    }

    tabelas
}
