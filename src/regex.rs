use regex::Regex;
use std::sync::LazyLock;

/// Valores monetários dos comprovantes de arrecadação: `1.234,56`
const VALOR_BR: &str = r"\d{1,3}(?:\.\d{3})*,\d{2}";

/// CNPJ formatado seguido da razão social até o fim da linha.
pub static RE_DARF_CNPJ_RAZAO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<CNPJ>\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2})\s+(?P<RazaoSocial>[^\n]+)").unwrap()
});

/// Período de apuração, data de vencimento e número do documento (14 ou mais dígitos).
pub static RE_DARF_PERIODO_DOCUMENTO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?P<PeriodoApuracao>\d{2}/\d{2}/\d{4}) \s+
        (?P<DataVencimento>\d{2}/\d{2}/\d{4})  \s+
        (?P<NumeroDocumento>\d{14,})
        ",
    )
    .unwrap()
});

/// Data de arrecadação seguida do banco (`001 - BANCO DO BRASIL`).
pub static RE_DARF_BANCO_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<DataArrecadacao>\d{2}/\d{2}/\d{4})\s+(?P<Banco>\d{3}\s*-\s*[^\n]+)").unwrap()
});

pub static RE_DARF_AGENCIA_ESTABELECIMENTO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<Agencia>\d{4})\s+(?P<Estabelecimento>\d{4})\s+(?P<ValorReservado>[\d,.]+)",
    )
    .unwrap()
});

pub static RE_DARF_TOTAIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        Totais \s+
        (?P<Principal>[\d,.]+) \s+
        (?P<Juros>[\d,.]+)     \s+
        (?P<Multa>[\d,.]+)     \s+
        (?P<Total>[\d,.]+)
        ",
    )
    .unwrap()
});

/// Linha de item do comprovante:
/// código de 4 dígitos, descrição, principal, multa (ou `-`), juros (ou `-`) e total.
pub static RE_DARF_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"^(?P<codigo>\d{{4}})\s+(?P<descricao>[A-ZÀ-ÿa-z0-9\-./\s]+?)\s+(?P<principal>{v})\s+(?P<multa>{v}|-)\s+(?P<juros>{v}|-)\s+(?P<total>{v})",
        v = VALOR_BR
    );
    Regex::new(&pattern).unwrap()
});

/// Linha seguinte ao item: subcódigo de 2 dígitos, hífen e descrição complementar.
pub static RE_DARF_SUBITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<subcodigo>\d{2})\s*-\s*(?P<complemento>.+)").unwrap());

// Regex para limpeza e validação
pub static RE_ANO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").unwrap());
pub static RE_NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").unwrap());
pub static RE_MES_ANO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<mes>\d{2})/(?P<ano>\d{4})$").unwrap());
pub static RE_PERIODO_CANONICO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}\d{2}\d{4}$").unwrap());

/// Resumos e tabelas de detalhe gerados por execuções anteriores.
pub static RE_RESUMO_GERADO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^ZZZ-\d{6}-Resumo do Cruzamento PIS COFINS.*\.csv$").unwrap()
});
