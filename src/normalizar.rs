//! Conversão de valores monetários e de períodos para a forma canônica.
//!
//! Todas as fontes convergem para a chave de período `01MMAAAA`
//! (dia 01, mês com 2 dígitos, ano com 4 dígitos).

use chrono::{Datelike, NaiveDate};

use crate::{
    CruzamentoError, CruzamentoResult, MESES_POR_EXTENSO, RE_ANO, RE_MES_ANO, RE_NON_DIGITS,
    RE_PERIODO_CANONICO,
};

// --- Valores ---

/// Converte um valor no formato brasileiro (`1.234,56`) em número.
///
/// Os pontos (separador de milhar) são removidos e a vírgula decimal vira ponto.
/// Valores `-` (campo não preenchido), vazios ou não numéricos resultam em erro.
pub fn parse_decimal(raw: &str) -> CruzamentoResult<f64> {
    let normalizado = raw.trim().replace('.', "").replace(',', ".");

    normalizado
        .parse::<f64>()
        .ok()
        .filter(|valor| valor.is_finite())
        .ok_or_else(|| CruzamentoError::valor_invalido(raw))
}

/// Igual a [`parse_decimal`], mas qualquer falha resulta em `0.0`.
///
/// ```
/// use cruzamento_pis_cofins::decimal_ou_zero;
///
/// assert_eq!(decimal_ou_zero("1.234,56"), 1234.56);
/// assert_eq!(decimal_ou_zero("abc"), 0.0);
/// ```
pub fn decimal_ou_zero(raw: &str) -> f64 {
    parse_decimal(raw).unwrap_or_default()
}

/// Converte um valor gravado como sequência de dígitos em centavos (`123456` -> `1234.56`).
///
/// Todos os caracteres que não são dígitos são descartados antes da conversão.
pub fn parse_centavos(raw: &str) -> CruzamentoResult<f64> {
    let digitos = RE_NON_DIGITS.replace_all(raw, "");

    if digitos.is_empty() {
        return Err(CruzamentoError::valor_invalido(raw));
    }

    digitos
        .parse::<f64>()
        .map(|centavos| centavos / 100.0)
        .map_err(|_| CruzamentoError::valor_invalido(raw))
}

/// Igual a [`parse_centavos`], mas uma string sem dígitos resulta em `0.0`.
pub fn centavos_ou_zero(raw: &str) -> f64 {
    parse_centavos(raw).unwrap_or_default()
}

// --- Períodos ---

fn chave_canonica(mes: u32, ano: i32) -> Option<String> {
    if (1..=12).contains(&mes) && (1000..=9999).contains(&ano) {
        Some(format!("01{mes:02}{ano}"))
    } else {
        None
    }
}

/// Período no formato numérico `AAAAMM` (campo MOFG da DCTF).
///
/// Só textos não numéricos resultam em `None`. Um mês ou ano fora da faixa
/// gera uma chave que não é data válida; a linha vai para o fim do resumo.
///
/// ```
/// use cruzamento_pis_cofins::periodo_de_aaaamm;
///
/// assert_eq!(periodo_de_aaaamm("202401").as_deref(), Some("01012024"));
/// assert_eq!(periodo_de_aaaamm("202413").as_deref(), Some("01132024"));
/// assert_eq!(periodo_de_aaaamm("abc"), None);
/// ```
pub fn periodo_de_aaaamm(x: &str) -> Option<String> {
    let numero: i64 = x.trim().parse().ok()?;
    let (ano, mes) = (numero.div_euclid(100), numero.rem_euclid(100));
    Some(format!("01{mes:02}{ano}"))
}

/// Período no formato `MM/AAAA`.
pub fn periodo_de_mes_ano(texto: &str) -> Option<String> {
    let caps = RE_MES_ANO.captures(texto.trim())?;
    chave_canonica(caps["mes"].parse().ok()?, caps["ano"].parse().ok()?)
}

/// Período a partir de uma data completa: `DD/MM/AAAA` (DARF) ou `DDMMAAAA` (EFD).
/// O dia é sempre substituído por 01.
pub fn periodo_de_data(texto: &str) -> Option<String> {
    parse_data(texto).and_then(|data| chave_canonica(data.month(), data.year()))
}

fn parse_data(texto: &str) -> Option<NaiveDate> {
    let texto = texto.trim();
    ["%d/%m/%Y", "%d%m%Y"]
        .iter()
        .find_map(|formato| NaiveDate::parse_from_str(texto, formato).ok())
}

/// Mês por extenso em português seguido do ano (`Março de 2024` -> `03/2024`).
///
/// O texto é convertido para minúsculas e sem acentos; o primeiro mês contido
/// no texto é combinado com o primeiro ano de 4 dígitos.
pub fn mes_extenso_para_mes_ano(texto: &str) -> Option<String> {
    let texto = limpar_texto(texto);

    MESES_POR_EXTENSO
        .iter()
        .filter(|(nome, _)| texto.contains(nome))
        .find_map(|(_, numero)| {
            RE_ANO
                .find(&texto)
                .map(|ano| format!("{numero}/{}", ano.as_str()))
        })
}

/// Data de uma célula de planilha convertida para `MM/AAAA`.
pub fn mes_ano_de_data(data: NaiveDate) -> String {
    format!("{:02}/{}", data.month(), data.year())
}

/// Reconstrói a data do primeiro dia a partir da chave canônica `01MMAAAA`.
pub fn data_do_periodo(chave: &str) -> CruzamentoResult<NaiveDate> {
    NaiveDate::parse_from_str(chave, "%d%m%Y").map_err(|_| CruzamentoError::periodo_invalido(chave))
}

pub fn eh_periodo_canonico(chave: &str) -> bool {
    RE_PERIODO_CANONICO.is_match(chave) && data_do_periodo(chave).is_ok()
}

/// Minúsculas, sem espaços nas extremidades e sem diacríticos.
pub fn limpar_texto(texto: &str) -> String {
    texto
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(remover_acento)
        .collect()
}

fn remover_acento(c: char) -> Option<char> {
    let base = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        c if c.is_ascii() => c,
        _ => return None,
    };
    Some(base)
}
