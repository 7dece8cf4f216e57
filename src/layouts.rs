//! Leiautes de posição fixa dos registros da DCTF (arquivo `.dec`).
//!
//! Cada campo é descrito por nome, coluna inicial e coluna final (base 1, inclusivas).
//! Acrescentar um novo tipo de registro exige apenas uma nova entrada em [`LAYOUTS_DCTF`].

/// Um campo de posição fixa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Campo {
    pub nome: &'static str,
    pub inicio: usize,
    pub fim: usize,
}

const fn campo(nome: &'static str, inicio: usize, fim: usize) -> Campo {
    Campo { nome, inicio, fim }
}

/// Leiaute associado a um tipo de registro.
pub type Layout = &'static [Campo];

pub const LAYOUT_R01: Layout = &[
    campo("Tipo", 1, 3),
    campo("CNPJ", 4, 17),
    campo("MOFG", 18, 23),
    campo("NomeEmpresarial", 24, 73),
    campo("VersaoPGD", 74, 78),
];

pub const LAYOUT_R10: Layout = &[
    campo("Tipo", 1, 3),
    campo("CNPJ", 4, 17),
    campo("MOFG", 18, 23),
    campo("CodReceita", 24, 29),
    campo("Periodicidade", 30, 30),
    campo("PeriodoApuracao", 31, 38),
    campo("ValorDebito", 39, 52),
    campo("ValorSuspenso", 53, 66),
];

pub const LAYOUT_R11: Layout = &[
    campo("Tipo", 1, 3),
    campo("CNPJ", 4, 17),
    campo("MOFG", 18, 23),
    campo("CodReceita", 24, 29),
    campo("PeriodoApuracao", 30, 37),
    campo("DataVencimento", 38, 45),
    campo("ValorPrincipal", 46, 59),
    campo("ValorMulta", 60, 73),
    campo("ValorJuros", 74, 87),
];

pub const LAYOUT_R12: Layout = &[
    campo("Tipo", 1, 3),
    campo("CNPJ", 4, 17),
    campo("MOFG", 18, 23),
    campo("CodReceita", 24, 29),
    campo("NumeroPerdcomp", 30, 53),
    campo("ValorCompensado", 54, 67),
];

pub const LAYOUT_R14: Layout = &[
    campo("Tipo", 1, 3),
    campo("CNPJ", 4, 17),
    campo("MOFG", 18, 23),
    campo("CodReceita", 24, 29),
    campo("NumeroProcesso", 30, 49),
    campo("ValorSuspenso", 50, 63),
];

/// Tabela de leiautes indexada pelo tipo de registro (3 caracteres).
pub const LAYOUTS_DCTF: &[(&str, Layout)] = &[
    ("R01", LAYOUT_R01),
    ("R10", LAYOUT_R10),
    ("R11", LAYOUT_R11),
    ("R12", LAYOUT_R12),
    ("R14", LAYOUT_R14),
];

/// Campos em ordem crescente, sem sobreposição e com `1 <= inicio <= fim`.
pub const fn layout_valido(layout: &[Campo]) -> bool {
    let mut i = 0;
    let mut fim_anterior = 0;
    while i < layout.len() {
        let c = layout[i];
        if c.inicio == 0 || c.inicio > c.fim || c.inicio <= fim_anterior {
            return false;
        }
        fim_anterior = c.fim;
        i += 1;
    }
    true
}

const fn todos_layouts_validos(layouts: &[(&str, Layout)]) -> bool {
    let mut i = 0;
    while i < layouts.len() {
        if layouts[i].0.len() != crate::DCTF_LARGURA_TIPO || !layout_valido(layouts[i].1) {
            return false;
        }
        i += 1;
    }
    true
}

const _: () = assert!(todos_layouts_validos(LAYOUTS_DCTF));

/// Procura o leiaute de um tipo de registro.
pub fn layout_do_tipo(tipo: &str) -> Option<Layout> {
    LAYOUTS_DCTF
        .iter()
        .find(|(t, _)| *t == tipo)
        .map(|(_, layout)| *layout)
}
