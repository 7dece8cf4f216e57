use calamine::{Data, ExcelDateTime, Reader, open_workbook_auto};
use chrono::NaiveDate;
use std::path::Path;

use crate::{
    CruzamentoError, CruzamentoResult, ler_texto, limpar_texto, mes_ano_de_data,
    mes_extenso_para_mes_ano, nome_do_arquivo, parse_decimal, periodo_de_data, periodo_de_mes_ano,
};

/// Prefixo do nome da coluna de período de apuração.
pub const PREFIXO_COLUNA_PERIODO: &str = "periodo_apuracao";
/// Trecho do nome da coluna de valor.
pub const TRECHO_COLUNA_VALOR: &str = "valor_principal";
/// Prefixo do nome da coluna de código de receita.
pub const PREFIXO_COLUNA_CODIGO: &str = "cod";

#[derive(Debug, Clone, PartialEq)]
pub enum Celula {
    Vazia,
    Numero(f64),
    Texto(String),
    Data(NaiveDate),
}

impl Celula {
    pub fn como_texto(&self) -> String {
        match self {
            Celula::Vazia => String::new(),
            Celula::Numero(n) => n.to_string(),
            Celula::Texto(s) => s.trim().to_string(),
            Celula::Data(d) => d.format("%d/%m/%Y").to_string(),
        }
    }

    /// Valor numérico da célula; textos não numéricos resultam em `None`.
    pub fn como_numero(&self) -> Option<f64> {
        match self {
            Celula::Numero(n) => Some(*n),
            Celula::Texto(s) if s.contains(',') => parse_decimal(s).ok(),
            Celula::Texto(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Celula::Vazia | Celula::Data(_) => None,
        }
    }

    /// Período `MM/AAAA`: mês por extenso, data de planilha ou texto `DD/MM/AAAA` / `MM/AAAA`.
    pub fn como_mes_ano(&self) -> Option<String> {
        match self {
            Celula::Data(d) => Some(mes_ano_de_data(*d)),
            Celula::Texto(s) => mes_extenso_para_mes_ano(s).or_else(|| {
                let texto = s.trim();
                if periodo_de_mes_ano(texto).is_some() {
                    return Some(texto.to_string());
                }
                periodo_de_data(texto).map(|chave| format!("{}/{}", &chave[2..4], &chave[4..]))
            }),
            Celula::Vazia | Celula::Numero(_) => None,
        }
    }
}

/// Primeira planilha do arquivo: cabeçalho e linhas de dados.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlanilhaBruta {
    pub cabecalho: Vec<String>,
    pub linhas: Vec<Vec<Celula>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistroPerdcomp {
    pub periodo_original: String,
    /// Período convertido para `MM/AAAA`.
    pub periodo: Option<String>,
    pub codigo: Option<String>,
    /// Valores das colunas de valor localizadas, na ordem do cabeçalho.
    pub valores: Vec<Option<f64>>,
}

impl RegistroPerdcomp {
    /// Valor da primeira coluna de valor.
    pub fn valor(&self) -> Option<f64> {
        self.valores.first().copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Perdcomp {
    pub arquivo_origem: String,
    pub coluna_periodo: Option<String>,
    pub colunas_valor: Vec<String>,
    pub coluna_codigo: Option<String>,
    pub registros: Vec<RegistroPerdcomp>,
}

impl Perdcomp {
    /// A planilha só contribui para o cruzamento se tiver colunas de período e de valor.
    pub fn tem_valores(&self) -> bool {
        self.coluna_periodo.is_some() && !self.colunas_valor.is_empty()
    }
}

/// Colunas localizadas pelo nome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColunasPerdcomp {
    pub periodo: Option<usize>,
    pub valores: Vec<usize>,
    pub codigo: Option<usize>,
}

/// Localiza as colunas sem diferenciar maiúsculas, minúsculas e acentos.
pub fn localizar_colunas(cabecalho: &[String]) -> ColunasPerdcomp {
    let nomes: Vec<String> = cabecalho.iter().map(|nome| limpar_texto(nome)).collect();

    ColunasPerdcomp {
        periodo: nomes
            .iter()
            .position(|nome| nome.starts_with(PREFIXO_COLUNA_PERIODO)),
        valores: nomes
            .iter()
            .enumerate()
            .filter(|(_, nome)| nome.contains(TRECHO_COLUNA_VALOR))
            .map(|(i, _)| i)
            .collect(),
        codigo: nomes
            .iter()
            .position(|nome| nome.starts_with(PREFIXO_COLUNA_CODIGO)),
    }
}

/// Converte a planilha bruta nos registros usados no cruzamento.
///
/// Células de valor não numéricas ficam ausentes (`None`), não zeradas.
pub fn normalizar_planilha(planilha: &PlanilhaBruta, arquivo_origem: &str) -> Perdcomp {
    let colunas = localizar_colunas(&planilha.cabecalho);
    let nome_coluna = |i: usize| planilha.cabecalho[i].clone();

    let mut perdcomp = Perdcomp {
        arquivo_origem: arquivo_origem.to_string(),
        coluna_periodo: colunas.periodo.map(nome_coluna),
        colunas_valor: colunas.valores.iter().copied().map(nome_coluna).collect(),
        coluna_codigo: colunas.codigo.map(nome_coluna),
        registros: Vec::new(),
    };

    let Some(idx_periodo) = colunas.periodo.filter(|_| !colunas.valores.is_empty()) else {
        log::warn!(
            "Planilha <{arquivo_origem}> sem colunas '{PREFIXO_COLUNA_PERIODO}*' e '*{TRECHO_COLUNA_VALOR}*': ignorada no cruzamento."
        );
        return perdcomp;
    };

    let celula = |linha: &[Celula], i: usize| linha.get(i).cloned().unwrap_or(Celula::Vazia);

    perdcomp.registros = planilha
        .linhas
        .iter()
        .map(|linha| {
            let periodo = celula(linha, idx_periodo);
            RegistroPerdcomp {
                periodo_original: periodo.como_texto(),
                periodo: periodo.como_mes_ano(),
                codigo: colunas
                    .codigo
                    .map(|i| celula(linha, i).como_texto())
                    .filter(|codigo| !codigo.is_empty()),
                valores: colunas
                    .valores
                    .iter()
                    .map(|&i| celula(linha, i).como_numero())
                    .collect(),
            }
        })
        .collect();

    perdcomp
}

// --- Leitura ---

/// Lê a primeira planilha de um arquivo `.xlsx`, `.xlsm`, `.xls`, `.ods` ou `.csv` (`;`).
pub fn ler_planilha(path: &Path) -> CruzamentoResult<PlanilhaBruta> {
    let extensao = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extensao.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => ler_pasta_de_trabalho(path),
        "csv" => ler_csv(path),
        _ => Err(CruzamentoError::ExtensaoNaoSuportada {
            arquivo: path.to_path_buf(),
            esperado: ".xlsx, .xls, .ods ou .csv",
        }),
    }
}

pub fn ler_perdcomp(path: &Path) -> CruzamentoResult<Perdcomp> {
    let planilha = ler_planilha(path)?;
    Ok(normalizar_planilha(&planilha, &nome_do_arquivo(path)))
}

fn ler_pasta_de_trabalho(path: &Path) -> CruzamentoResult<PlanilhaBruta> {
    let erro = |mensagem: String| CruzamentoError::Planilha {
        arquivo: path.to_path_buf(),
        mensagem,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| erro(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| CruzamentoError::PlanilhaVazia {
            arquivo: path.to_path_buf(),
        })?
        .map_err(|e| erro(e.to_string()))?;

    let mut linhas = range
        .rows()
        .map(|linha| linha.iter().map(celula_de_dado).collect::<Vec<Celula>>());

    let cabecalho: Vec<Celula> = linhas.next().ok_or_else(|| CruzamentoError::PlanilhaVazia {
        arquivo: path.to_path_buf(),
    })?;

    Ok(PlanilhaBruta {
        cabecalho: cabecalho.iter().map(Celula::como_texto).collect(),
        linhas: linhas.collect(),
    })
}

fn celula_de_dado(dado: &Data) -> Celula {
    match dado {
        Data::Empty | Data::Error(_) => Celula::Vazia,
        Data::Int(n) => Celula::Numero(*n as f64),
        Data::Float(n) => Celula::Numero(*n),
        Data::String(s) | Data::DurationIso(s) => Celula::Texto(s.clone()),
        Data::Bool(b) => Celula::Texto(b.to_string()),
        Data::DateTime(dt) => data_de_excel(dt).map_or(Celula::Vazia, Celula::Data),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map_or_else(|| Celula::Texto(s.clone()), Celula::Data),
    }
}

/// Data de uma célula do Excel, no sistema de datas da pasta (1900 ou 1904).
///
/// Durações (`[hh]:mm:ss`) não são datas.
fn data_de_excel(dt: &ExcelDateTime) -> Option<NaiveDate> {
    if !dt.is_datetime() {
        return None;
    }
    dt.as_datetime().map(|d| d.date())
}

fn ler_csv(path: &Path) -> CruzamentoResult<PlanilhaBruta> {
    let texto = ler_texto(path)?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(texto.as_bytes());

    let cabecalho: Vec<String> = rdr.headers()?.iter().map(String::from).collect();

    let linhas = rdr
        .records()
        .map(|record| {
            record.map(|record| {
                record
                    .iter()
                    .map(|campo| {
                        if campo.is_empty() {
                            Celula::Vazia
                        } else {
                            Celula::Texto(campo.to_string())
                        }
                    })
                    .collect()
            })
        })
        .collect::<Result<Vec<Vec<Celula>>, csv::Error>>()?;

    Ok(PlanilhaBruta { cabecalho, linhas })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texto(s: &str) -> Celula {
        Celula::Texto(s.to_string())
    }

    fn planilha(cabecalho: &[&str], linhas: Vec<Vec<Celula>>) -> PlanilhaBruta {
        PlanilhaBruta {
            cabecalho: cabecalho.iter().map(|s| s.to_string()).collect(),
            linhas,
        }
    }

    #[test]
    fn colunas_por_prefixo_e_trecho() {
        let cabecalho: Vec<String> = [
            "ID",
            "Periodo_Apuracao_Credito",
            "Cod_Receita",
            "Valor_Principal_Tributo",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let colunas = localizar_colunas(&cabecalho);
        assert_eq!(colunas.periodo, Some(1));
        assert_eq!(colunas.codigo, Some(2));
        assert_eq!(colunas.valores, vec![3]);
    }

    #[test]
    fn normaliza_periodo_e_valor() {
        let p = planilha(
            &["PERIODO_APURACAO", "CODIGO", "VALOR_PRINCIPAL_TRIBUTO"],
            vec![
                vec![texto("Janeiro de 2024"), texto("8109"), Celula::Numero(150.0)],
                vec![texto("março/2024"), texto("2172-01"), texto("1.234,56")],
                vec![texto("abril 2024"), Celula::Vazia, texto("n/d")],
            ],
        );
        let perdcomp = normalizar_planilha(&p, "perdcomp.xlsx");

        assert!(perdcomp.tem_valores());
        assert_eq!(perdcomp.coluna_codigo.as_deref(), Some("CODIGO"));
        assert_eq!(perdcomp.registros.len(), 3);

        let r = &perdcomp.registros;
        assert_eq!(r[0].periodo.as_deref(), Some("01/2024"));
        assert_eq!(r[0].valor(), Some(150.0));
        assert_eq!(r[1].periodo.as_deref(), Some("03/2024"));
        assert_eq!(r[1].codigo.as_deref(), Some("2172-01"));
        assert_eq!(r[1].valor(), Some(1234.56));
        assert_eq!(r[2].codigo, None);
        assert_eq!(r[2].valor(), None);
    }

    #[test]
    fn sem_coluna_de_valor_fica_ausente() {
        let p = planilha(
            &["periodo_apuracao", "total"],
            vec![vec![texto("Janeiro de 2024"), Celula::Numero(1.0)]],
        );
        let perdcomp = normalizar_planilha(&p, "x.xlsx");
        assert!(!perdcomp.tem_valores());
        assert!(perdcomp.registros.is_empty());
    }

    #[test]
    fn periodo_em_data_de_planilha() {
        let data = Celula::Data(NaiveDate::from_ymd_opt(2023, 11, 30).unwrap());
        assert_eq!(data.como_mes_ano().as_deref(), Some("11/2023"));
        assert_eq!(texto("15/02/2024").como_mes_ano().as_deref(), Some("02/2024"));
        assert_eq!(texto("02/2024").como_mes_ano().as_deref(), Some("02/2024"));
        assert_eq!(texto("sem periodo").como_mes_ano(), None);
    }

    #[test]
    fn serial_do_excel() {
        use calamine::ExcelDateTimeType::{DateTime, TimeDelta};

        let jan_2024 = ExcelDateTime::new(45292.0, DateTime, false);
        assert_eq!(data_de_excel(&jan_2024), NaiveDate::from_ymd_opt(2024, 1, 1));

        let duracao = ExcelDateTime::new(1.5, TimeDelta, false);
        assert_eq!(data_de_excel(&duracao), None);
    }

    #[test]
    fn serial_no_sistema_1904() {
        use calamine::ExcelDateTimeType::DateTime;

        // o mesmo serial, em pasta com datas a partir de 1904, cai 1462 dias depois
        let serial = ExcelDateTime::new(45292.0, DateTime, true);
        let celula = celula_de_dado(&Data::DateTime(serial));
        assert_eq!(celula, Celula::Data(NaiveDate::from_ymd_opt(2028, 1, 2).unwrap()));
        assert_eq!(celula.como_mes_ano().as_deref(), Some("01/2028"));
    }

    #[test]
    fn csv_com_ponto_e_virgula() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("perdcomp.csv");
        std::fs::write(
            &path,
            "periodo_apuracao;valor_principal\nJaneiro de 2024;100,50\nFevereiro de 2024;\n",
        )
        .unwrap();

        let perdcomp = ler_perdcomp(&path).unwrap();
        assert_eq!(perdcomp.arquivo_origem, "perdcomp.csv");
        assert_eq!(perdcomp.registros.len(), 2);
        assert_eq!(perdcomp.registros[0].valor(), Some(100.5));
        assert_eq!(perdcomp.registros[1].valor(), None);
        assert_eq!(perdcomp.coluna_codigo, None);
    }

    #[test]
    fn extensao_desconhecida() {
        assert!(matches!(
            ler_planilha(Path::new("dados.pdf")),
            Err(CruzamentoError::ExtensaoNaoSuportada { .. })
        ));
    }
}
