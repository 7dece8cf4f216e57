//! Extração de itens dos comprovantes de arrecadação (DARF) a partir do texto das páginas.
//!
//! Cada página passa por duas fases:
//! 1. Cabeçalho: buscas independentes por expressões regulares; os grupos encontrados
//!    são mesclados em um único mapa.
//! 2. Itens: varredura das linhas em busca de um item seguido imediatamente da
//!    linha de subcódigo. Um par completo avança a varredura em duas linhas;
//!    qualquer outro caso avança uma linha.

use regex::{Captures, Regex};
use std::{collections::BTreeMap, fs, path::Path};

use crate::{
    CruzamentoError, CruzamentoResult, RE_DARF_AGENCIA_ESTABELECIMENTO, RE_DARF_BANCO_DATA,
    RE_DARF_CNPJ_RAZAO, RE_DARF_ITEM, RE_DARF_PERIODO_DOCUMENTO, RE_DARF_SUBITEM, RE_DARF_TOTAIS,
    decimal_ou_zero, ler_texto,
};

/// Separador de páginas nos comprovantes já convertidos para texto.
pub const SEPARADOR_DE_PAGINAS: char = '\u{c}';

/// Campos do cabeçalho: nome do grupo de captura -> valor.
pub type CabecalhoDarf = BTreeMap<String, String>;

/// Páginas de texto de um comprovante.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComprovanteDarf {
    pub nome: String,
    pub paginas: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemDarf {
    pub cabecalho: CabecalhoDarf,
    /// Código de receita com subcódigo (`8109-02`, ou `810902` após o pós-processamento).
    pub codigo: String,
    pub descricao_principal: String,
    pub descricao_complementar: String,
    pub principal_item: String,
    pub multa_item: String,
    pub juros_item: String,
    pub total_item: String,
    /// Período de apuração sem espaços nas extremidades.
    pub periodo_ajustado: Option<String>,
    pub arquivo_origem: String,
}

impl ItemDarf {
    pub fn periodo_apuracao(&self) -> Option<&str> {
        self.cabecalho.get("PeriodoApuracao").map(String::as_str)
    }

    pub fn principal(&self) -> f64 {
        decimal_ou_zero(&self.principal_item)
    }
}

// --- Cabeçalho ---

fn padroes_do_cabecalho() -> [&'static Regex; 5] {
    [
        &RE_DARF_CNPJ_RAZAO,
        &RE_DARF_PERIODO_DOCUMENTO,
        &RE_DARF_BANCO_DATA,
        &RE_DARF_AGENCIA_ESTABELECIMENTO,
        &RE_DARF_TOTAIS,
    ]
}

/// Mescla os grupos nomeados de todas as buscas que encontraram correspondência.
pub fn extrair_cabecalho(texto: &str) -> CabecalhoDarf {
    let mut cabecalho = CabecalhoDarf::new();

    for regex in padroes_do_cabecalho() {
        let Some(caps) = regex.captures(texto) else {
            continue;
        };

        for nome in regex.capture_names().flatten() {
            if let Some(valor) = caps.name(nome) {
                cabecalho.insert(nome.to_string(), valor.as_str().to_string());
            }
        }
    }

    cabecalho
}

// --- Itens ---

/// Linha principal de um item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinhaItem<'t> {
    pub codigo: &'t str,
    pub descricao: &'t str,
    pub principal: &'t str,
    pub multa: &'t str,
    pub juros: &'t str,
    pub total: &'t str,
}

impl<'t> LinhaItem<'t> {
    pub fn parse(linha: &'t str) -> Option<Self> {
        let caps = RE_DARF_ITEM.captures(linha)?;

        Some(LinhaItem {
            codigo: captura(&caps, "codigo"),
            descricao: captura(&caps, "descricao").trim(),
            principal: captura(&caps, "principal"),
            multa: captura(&caps, "multa"),
            juros: captura(&caps, "juros"),
            total: captura(&caps, "total"),
        })
    }
}

/// Linha de continuação: subcódigo e descrição complementar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubItem<'t> {
    pub subcodigo: &'t str,
    pub complemento: &'t str,
}

impl<'t> SubItem<'t> {
    pub fn parse(linha: &'t str) -> Option<Self> {
        let caps = RE_DARF_SUBITEM.captures(linha)?;

        Some(SubItem {
            subcodigo: captura(&caps, "subcodigo"),
            complemento: captura(&caps, "complemento").trim(),
        })
    }
}

fn captura<'t>(caps: &Captures<'t>, nome: &str) -> &'t str {
    caps.name(nome).map(|m| m.as_str()).unwrap_or_default()
}

/// Resultado da análise de uma linha e da linha seguinte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transicao<'t> {
    /// Item e subcódigo encontrados: o par é consumido.
    Emitir(LinhaItem<'t>, SubItem<'t>),
    /// Não há item completo começando nesta linha.
    Avancar,
}

impl Transicao<'_> {
    /// Número de linhas consumidas pela transição.
    pub fn avanco(&self) -> usize {
        match self {
            Transicao::Emitir(..) => 2,
            Transicao::Avancar => 1,
        }
    }
}

/// Decide a transição para um item já reconhecido e a linha seguinte.
pub fn concluir_item<'t>(item: LinhaItem<'t>, seguinte: &'t str) -> Transicao<'t> {
    match SubItem::parse(seguinte) {
        Some(subitem) => Transicao::Emitir(item, subitem),
        None => Transicao::Avancar,
    }
}

/// Analisa o par (linha atual, linha seguinte).
pub fn avaliar_par<'t>(linha: &'t str, seguinte: &'t str) -> Transicao<'t> {
    match LinhaItem::parse(linha) {
        Some(item) => concluir_item(item, seguinte),
        None => Transicao::Avancar,
    }
}

enum Estado<'t> {
    Procurando,
    ItemAguardandoSubitem(LinhaItem<'t>),
}

/// Itens de uma página. A varredura termina quando restam menos de duas linhas.
pub fn extrair_itens_pagina(texto: &str, arquivo_origem: &str) -> Vec<ItemDarf> {
    let cabecalho = extrair_cabecalho(texto);
    let linhas: Vec<&str> = texto.lines().collect();

    let mut itens = Vec::new();
    let mut estado = Estado::Procurando;
    let mut i = 0;

    while i + 1 < linhas.len() {
        estado = match estado {
            Estado::Procurando => match LinhaItem::parse(linhas[i]) {
                Some(item) => Estado::ItemAguardandoSubitem(item),
                None => {
                    i += 1;
                    Estado::Procurando
                }
            },
            Estado::ItemAguardandoSubitem(item) => {
                let transicao = concluir_item(item, linhas[i + 1]);
                i += transicao.avanco();

                if let Transicao::Emitir(item, subitem) = transicao {
                    itens.push(novo_item(&cabecalho, item, subitem, arquivo_origem));
                }

                Estado::Procurando
            }
        };
    }

    itens
}

fn novo_item(
    cabecalho: &CabecalhoDarf,
    item: LinhaItem,
    subitem: SubItem,
    arquivo_origem: &str,
) -> ItemDarf {
    ItemDarf {
        cabecalho: cabecalho.clone(),
        codigo: format!("{}-{}", item.codigo, subitem.subcodigo),
        descricao_principal: item.descricao.to_string(),
        descricao_complementar: subitem.complemento.to_string(),
        principal_item: item.principal.to_string(),
        multa_item: item.multa.to_string(),
        juros_item: item.juros.to_string(),
        total_item: item.total.to_string(),
        periodo_ajustado: None,
        arquivo_origem: arquivo_origem.to_string(),
    }
}

/// Remove o hífen do código e ajusta o período de apuração.
fn pos_processar(item: &mut ItemDarf) {
    item.codigo = item.codigo.replace('-', "");
    item.periodo_ajustado = item.periodo_apuracao().map(|p| p.trim().to_string());
}

/// Itens de todas as páginas de todos os comprovantes, em uma única tabela.
pub fn extrair_itens_darf(comprovantes: &[ComprovanteDarf]) -> Vec<ItemDarf> {
    let mut itens: Vec<ItemDarf> = comprovantes
        .iter()
        .flat_map(|comprovante| {
            comprovante
                .paginas
                .iter()
                .flat_map(|pagina| extrair_itens_pagina(pagina, &comprovante.nome))
        })
        .collect();

    itens.iter_mut().for_each(pos_processar);
    itens
}

/// Lê as páginas de um comprovante.
///
/// Arquivos `.pdf` têm a camada de texto extraída página a página;
/// arquivos `.txt` já contêm o texto, com páginas separadas por form feed.
pub fn ler_comprovante_darf(path: &Path) -> CruzamentoResult<ComprovanteDarf> {
    let nome = nome_do_arquivo(path);
    let extensao = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let paginas = match extensao.as_str() {
        "pdf" => {
            let bytes = fs::read(path).map_err(|e| CruzamentoError::IoReader {
                source: e,
                arquivo: path.to_path_buf(),
            })?;
            pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
                CruzamentoError::Pdf {
                    arquivo: path.to_path_buf(),
                    mensagem: e.to_string(),
                }
            })?
        }
        "txt" => ler_texto(path)?
            .split(SEPARADOR_DE_PAGINAS)
            .map(String::from)
            .collect(),
        _ => {
            return Err(CruzamentoError::ExtensaoNaoSuportada {
                arquivo: path.to_path_buf(),
                esperado: ".pdf ou .txt",
            });
        }
    };

    Ok(ComprovanteDarf { nome, paginas })
}

pub fn nome_do_arquivo(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
