use std::fmt;

// --- Tabelas de Referência ---

/// Contribuições cruzadas pelo programa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tributo {
    Pis,
    Cofins,
}

impl Tributo {
    pub const TODOS: [Tributo; 2] = [Tributo::Pis, Tributo::Cofins];

    /// Prefixos (4 primeiros dígitos) dos códigos de receita de cada contribuição.
    pub fn codigos_de_receita(self) -> &'static [&'static str] {
        match self {
            Tributo::Pis => &["8109", "6912"],
            Tributo::Cofins => &["2172", "5856"],
        }
    }

    /// Registro da EFD Contribuições que consolida a contribuição do período.
    pub fn registro_efd(self) -> &'static str {
        match self {
            Tributo::Pis => "M200",
            Tributo::Cofins => "M600",
        }
    }

    /// Classifica um código de receita pelos seus 4 primeiros caracteres.
    ///
    /// ```
    /// use cruzamento_pis_cofins::Tributo;
    ///
    /// assert_eq!(Tributo::from_codigo_receita("810902"), Some(Tributo::Pis));
    /// assert_eq!(Tributo::from_codigo_receita("5856-01"), Some(Tributo::Cofins));
    /// assert_eq!(Tributo::from_codigo_receita("0561"), None);
    /// ```
    pub fn from_codigo_receita(codigo: &str) -> Option<Tributo> {
        let codigo = codigo.trim();
        let prefixo: String = codigo.chars().take(4).collect();
        Tributo::TODOS
            .into_iter()
            .find(|tributo| tributo.codigos_de_receita().contains(&prefixo.as_str()))
    }
}

impl fmt::Display for Tributo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tributo::Pis => write!(f, "PIS"),
            Tributo::Cofins => write!(f, "COFINS"),
        }
    }
}

/// Meses por extenso, já sem acentos, e seus números com 2 dígitos.
pub const MESES_POR_EXTENSO: [(&str, &str); 12] = [
    ("janeiro", "01"),
    ("fevereiro", "02"),
    ("marco", "03"),
    ("abril", "04"),
    ("maio", "05"),
    ("junho", "06"),
    ("julho", "07"),
    ("agosto", "08"),
    ("setembro", "09"),
    ("outubro", "10"),
    ("novembro", "11"),
    ("dezembro", "12"),
];

// --- EFD Contribuições ---

/// Registro de abertura do arquivo.
pub const EFD_REGISTRO_ABERTURA: &str = "0000";
/// Posição de DT_INI no registro 0000 (a posição 0 é o próprio registro).
pub const EFD_CAMPO_DT_INI: usize = 5;
/// Posição de VL_TOT_CONT_REC nos registros M200 e M600.
pub const EFD_CAMPO_VL_TOT_CONT_REC: usize = 12;

// --- DCTF ---

/// Registro de débito apurado.
pub const DCTF_REGISTRO_DEBITO: &str = "R10";
/// Largura da identificação do tipo de registro no início de cada linha.
pub const DCTF_LARGURA_TIPO: usize = 3;

/// Coluna com o nome do arquivo de origem, acrescentada a todas as tabelas.
pub const COLUNA_ARQUIVO_ORIGEM: &str = "ArquivoOrigem";

// --- Resumo ---

pub const ROTULO_TOTAL: &str = "TOTAL";

/// Colunas do resumo consolidado, na ordem de exportação.
pub const COLUNAS_RESUMO: [&str; 17] = [
    "PERIODO",
    "[EFD] PIS",
    "[EFD] COFINS",
    "[DCTF] PIS",
    "[DCTF] COFINS",
    "[DARF] PIS",
    "[DARF] COFINS",
    "[SUSPENSÃO] PIS",
    "[SUSPENSÃO] COFINS",
    "[PARCELAMENTOS] PIS",
    "[PARCELAMENTOS] COFINS",
    "[PERDCOMP] PIS",
    "[PERDCOMP] COFINS",
    "[DIVERGÊNCIA EFD] PIS",
    "[DIVERGÊNCIA EFD] COFINS",
    "[DIVERGÊNCIA DCTF] PIS",
    "[DIVERGÊNCIA DCTF] COFINS",
];
