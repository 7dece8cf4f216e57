//! Cruzamento das quatro fontes por período de apuração.
//!
//! Cada fonte é somada por período e por contribuição. As somas são unidas pela
//! chave canônica `01MMAAAA`; a ausência de uma fonte ou de um período em uma fonte
//! vale zero, nunca um valor ausente. As divergências são calculadas depois dessa
//! união, já com todos os termos preenchidos.

use std::{
    collections::BTreeMap,
    ops::{Add, AddAssign, Sub},
};

use crate::{
    COLUNAS_RESUMO, CruzamentoError, CruzamentoResult, EFD_CAMPO_VL_TOT_CONT_REC, ItemDarf,
    Perdcomp, ROTULO_TOTAL, RegistroEfd, TabelasDctf, Tributo, data_do_periodo, debitos_dctf,
    parse_centavos, parse_decimal, periodo_de_aaaamm, periodo_de_data, periodo_de_mes_ano,
};

/// Par de valores PIS e COFINS.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PisCofins {
    pub pis: f64,
    pub cofins: f64,
}

impl PisCofins {
    pub const ZERO: PisCofins = PisCofins {
        pis: 0.0,
        cofins: 0.0,
    };

    pub fn get(self, tributo: Tributo) -> f64 {
        match tributo {
            Tributo::Pis => self.pis,
            Tributo::Cofins => self.cofins,
        }
    }

    pub fn get_mut(&mut self, tributo: Tributo) -> &mut f64 {
        match tributo {
            Tributo::Pis => &mut self.pis,
            Tributo::Cofins => &mut self.cofins,
        }
    }
}

impl Add for PisCofins {
    type Output = PisCofins;

    fn add(self, rhs: PisCofins) -> PisCofins {
        PisCofins {
            pis: self.pis + rhs.pis,
            cofins: self.cofins + rhs.cofins,
        }
    }
}

impl AddAssign for PisCofins {
    fn add_assign(&mut self, rhs: PisCofins) {
        *self = *self + rhs;
    }
}

impl Sub for PisCofins {
    type Output = PisCofins;

    fn sub(self, rhs: PisCofins) -> PisCofins {
        PisCofins {
            pis: self.pis - rhs.pis,
            cofins: self.cofins - rhs.cofins,
        }
    }
}

/// Somas de uma fonte: período canônico -> valores.
pub type SomasPorPeriodo = BTreeMap<String, PisCofins>;

/// Único ponto em que uma falha de conversão vira zero.
///
/// O período entra no resultado mesmo quando o valor é inválido.
fn acumular(
    somas: &mut SomasPorPeriodo,
    periodo: String,
    tributo: Tributo,
    valor: CruzamentoResult<f64>,
) {
    let valor = valor.unwrap_or_else(|err| {
        log::debug!("{err} no período {periodo} ({tributo}): somado como zero.");
        0.0
    });
    *somas.entry(periodo).or_default().get_mut(tributo) += valor;
}

// --- Somas por fonte ---

/// EFD Contribuições: VL_TOT_CONT_REC dos registros M200 (PIS) e M600 (COFINS).
pub fn somar_efd(registros: &[RegistroEfd]) -> SomasPorPeriodo {
    let mut somas = SomasPorPeriodo::new();

    for registro in registros {
        let Some(tributo) = Tributo::TODOS
            .into_iter()
            .find(|t| t.registro_efd() == registro.registro())
        else {
            continue;
        };

        let Some(periodo) = registro.periodo.as_deref().and_then(periodo_de_data) else {
            continue;
        };

        let valor = registro
            .campo(EFD_CAMPO_VL_TOT_CONT_REC)
            .map_or_else(|| parse_decimal(""), parse_decimal);

        acumular(&mut somas, periodo, tributo, valor);
    }

    somas
}

/// DCTF: ValorDebito dos registros R10, classificados pelo código de receita.
pub fn somar_dctf(tabelas: &TabelasDctf) -> SomasPorPeriodo {
    let mut somas = SomasPorPeriodo::new();

    for registro in debitos_dctf(tabelas) {
        let Some(tributo) = Tributo::from_codigo_receita(registro.get("CodReceita")) else {
            continue;
        };

        let Some(periodo) = periodo_de_aaaamm(registro.get("MOFG")) else {
            continue;
        };

        acumular(
            &mut somas,
            periodo,
            tributo,
            parse_centavos(registro.get("ValorDebito")),
        );
    }

    somas
}

/// DARF: valor principal de cada item, classificado pelo código de receita.
pub fn somar_darf(itens: &[ItemDarf]) -> SomasPorPeriodo {
    let mut somas = SomasPorPeriodo::new();

    for item in itens {
        let Some(tributo) = Tributo::from_codigo_receita(&item.codigo) else {
            continue;
        };

        let Some(periodo) = item.periodo_ajustado.as_deref().and_then(periodo_de_data) else {
            continue;
        };

        acumular(
            &mut somas,
            periodo,
            tributo,
            parse_decimal(&item.principal_item),
        );
    }

    somas
}

/// PER/DCOMP: valor da primeira coluna de valor.
///
/// Sem coluna de código, o valor total de cada período é atribuído ao PIS e
/// também à COFINS.
pub fn somar_perdcomp(perdcomp: Option<&Perdcomp>) -> SomasPorPeriodo {
    let mut somas = SomasPorPeriodo::new();

    let Some(perdcomp) = perdcomp.filter(|p| p.tem_valores()) else {
        return somas;
    };

    let sem_codigo = perdcomp.coluna_codigo.is_none();
    if sem_codigo && !perdcomp.registros.is_empty() {
        log::warn!(
            "Planilha <{}> sem coluna de código de receita: o mesmo valor foi atribuído ao PIS e à COFINS.",
            perdcomp.arquivo_origem
        );
    }

    for registro in &perdcomp.registros {
        let Some(periodo) = registro.periodo.as_deref().and_then(periodo_de_mes_ano) else {
            continue;
        };

        let tributos: Vec<Tributo> = if sem_codigo {
            Tributo::TODOS.to_vec()
        } else {
            registro
                .codigo
                .as_deref()
                .and_then(Tributo::from_codigo_receita)
                .into_iter()
                .collect()
        };

        for tributo in tributos {
            let valor = registro.valor().ok_or_else(|| {
                CruzamentoError::valor_invalido(&format!(
                    "{} ({})",
                    perdcomp.colunas_valor[0], registro.periodo_original
                ))
            });
            acumular(&mut somas, periodo.clone(), tributo, valor);
        }
    }

    somas
}

// --- Linhas do resumo ---

#[derive(Debug, Clone, PartialEq)]
pub struct LinhaResumo {
    pub periodo: String,
    pub efd: PisCofins,
    pub dctf: PisCofins,
    pub darf: PisCofins,
    pub suspensao: PisCofins,
    pub parcelamentos: PisCofins,
    pub perdcomp: PisCofins,
    pub divergencia_efd: PisCofins,
    pub divergencia_dctf: PisCofins,
}

/// Número de colunas numéricas (todas menos PERIODO).
pub const NUM_COLUNAS_NUMERICAS: usize = COLUNAS_RESUMO.len() - 1;

impl LinhaResumo {
    /// Linha de um período; divergência = declarado - (pago + compensado + parcelado).
    pub fn new(
        periodo: String,
        efd: PisCofins,
        dctf: PisCofins,
        darf: PisCofins,
        perdcomp: PisCofins,
    ) -> Self {
        let suspensao = PisCofins::ZERO;
        let parcelamentos = PisCofins::ZERO;
        let quitado = darf + perdcomp + parcelamentos;

        LinhaResumo {
            periodo,
            efd,
            dctf,
            darf,
            suspensao,
            parcelamentos,
            perdcomp,
            divergencia_efd: efd - quitado,
            divergencia_dctf: dctf - quitado,
        }
    }

    /// Valores na ordem de [`COLUNAS_RESUMO`], sem o período.
    pub fn valores(&self) -> [f64; NUM_COLUNAS_NUMERICAS] {
        [
            self.efd.pis,
            self.efd.cofins,
            self.dctf.pis,
            self.dctf.cofins,
            self.darf.pis,
            self.darf.cofins,
            self.suspensao.pis,
            self.suspensao.cofins,
            self.parcelamentos.pis,
            self.parcelamentos.cofins,
            self.perdcomp.pis,
            self.perdcomp.cofins,
            self.divergencia_efd.pis,
            self.divergencia_efd.cofins,
            self.divergencia_dctf.pis,
            self.divergencia_dctf.cofins,
        ]
    }

    /// Inverso de [`LinhaResumo::valores`].
    pub fn from_valores(periodo: String, v: [f64; NUM_COLUNAS_NUMERICAS]) -> Self {
        let par = |i: usize| PisCofins {
            pis: v[i],
            cofins: v[i + 1],
        };

        LinhaResumo {
            periodo,
            efd: par(0),
            dctf: par(2),
            darf: par(4),
            suspensao: par(6),
            parcelamentos: par(8),
            perdcomp: par(10),
            divergencia_efd: par(12),
            divergencia_dctf: par(14),
        }
    }

    pub fn eh_total(&self) -> bool {
        self.periodo == ROTULO_TOTAL
    }
}

/// Resumo consolidado: uma linha por período, em ordem cronológica, e a linha TOTAL.
#[derive(Debug, Clone, PartialEq)]
pub struct Resumo {
    pub linhas: Vec<LinhaResumo>,
}

impl Resumo {
    pub fn colunas() -> &'static [&'static str] {
        &COLUNAS_RESUMO
    }

    /// Linhas de períodos, sem a linha TOTAL.
    pub fn periodos(&self) -> &[LinhaResumo] {
        match self.linhas.split_last() {
            Some((ultima, periodos)) if ultima.eh_total() => periodos,
            _ => &self.linhas,
        }
    }

    pub fn total(&self) -> Option<&LinhaResumo> {
        self.linhas.last().filter(|linha| linha.eh_total())
    }

    pub fn linha(&self, periodo: &str) -> Option<&LinhaResumo> {
        self.linhas.iter().find(|linha| linha.periodo == periodo)
    }
}

// --- Cruzamento ---

#[derive(Debug, Clone, Copy, Default)]
struct SomasDoPeriodo {
    efd: PisCofins,
    dctf: PisCofins,
    darf: PisCofins,
    perdcomp: PisCofins,
}

/// Une as somas de todas as fontes (união de períodos, zero para o lado ausente).
fn unir_fontes(
    efd: SomasPorPeriodo,
    dctf: SomasPorPeriodo,
    darf: SomasPorPeriodo,
    perdcomp: SomasPorPeriodo,
) -> BTreeMap<String, SomasDoPeriodo> {
    let mut unidas: BTreeMap<String, SomasDoPeriodo> = BTreeMap::new();

    for (periodo, valores) in efd {
        unidas.entry(periodo).or_default().efd += valores;
    }
    for (periodo, valores) in dctf {
        unidas.entry(periodo).or_default().dctf += valores;
    }
    for (periodo, valores) in darf {
        unidas.entry(periodo).or_default().darf += valores;
    }
    for (periodo, valores) in perdcomp {
        unidas.entry(periodo).or_default().perdcomp += valores;
    }

    unidas
}

/// Ordena as linhas pela data do período; chaves inválidas ficam no fim.
pub fn ordenar_periodos(linhas: &mut [LinhaResumo]) {
    linhas.sort_by_key(|linha| {
        let data = data_do_periodo(&linha.periodo).ok();
        (data.is_none(), data)
    });
}

/// Linha TOTAL: soma, coluna a coluna, de todas as linhas recebidas.
pub fn linha_de_totais(linhas: &[LinhaResumo]) -> LinhaResumo {
    let totais = linhas
        .iter()
        .fold([0.0; NUM_COLUNAS_NUMERICAS], |mut acc, linha| {
            for (total, valor) in acc.iter_mut().zip(linha.valores()) {
                *total += valor;
            }
            acc
        });

    LinhaResumo::from_valores(ROTULO_TOTAL.to_string(), totais)
}

/// Gera o resumo consolidado a partir das fontes disponíveis.
///
/// Fontes vazias contribuem com zero em todas as colunas. Sem nenhuma fonte,
/// o resultado tem apenas a linha TOTAL zerada.
pub fn gerar_resumo(
    efd: &[RegistroEfd],
    dctf: &TabelasDctf,
    darf: &[ItemDarf],
    perdcomp: Option<&Perdcomp>,
) -> Resumo {
    let unidas = unir_fontes(
        somar_efd(efd),
        somar_dctf(dctf),
        somar_darf(darf),
        somar_perdcomp(perdcomp),
    );

    let mut linhas: Vec<LinhaResumo> = unidas
        .into_iter()
        .map(|(periodo, s)| LinhaResumo::new(periodo, s.efd, s.dctf, s.darf, s.perdcomp))
        .collect();

    ordenar_periodos(&mut linhas);
    linhas.push(linha_de_totais(&linhas));

    Resumo { linhas }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Celula, ComprovanteDarf, Documento, PlanilhaBruta, dctf::tests::linha_r10,
        darf::tests::PAGINA, extrair_itens_darf, gerar_tabelas_dctf, normalizar_planilha,
        parse_efds,
    };

    fn dctf(linhas: &[String]) -> TabelasDctf {
        gerar_tabelas_dctf(&[Documento::new("dctf.dec", linhas.join("\n"))])
    }

    fn efd(periodo: &str, pis: &str, cofins: &str) -> Documento {
        Documento::new(
            format!("efd-{periodo}.txt"),
            format!(
                "|0000|006|0|||{periodo}|31012024|EMPRESA|12345678000199|SP|\n\
                 |M200|0|0|0|0|0|0|0|0|0|0|0|{pis}|\n\
                 |M600|0|0|0|0|0|0|0|0|0|0|0|{cofins}|\n"
            ),
        )
    }

    fn perdcomp(cabecalho: &[&str], linhas: Vec<Vec<Celula>>) -> Perdcomp {
        let planilha = PlanilhaBruta {
            cabecalho: cabecalho.iter().map(|s| s.to_string()).collect(),
            linhas,
        };
        normalizar_planilha(&planilha, "perdcomp.xlsx")
    }

    fn texto(s: &str) -> Celula {
        Celula::Texto(s.to_string())
    }

    #[test]
    fn somente_dctf() {
        let tabelas = dctf(&[linha_r10("202401", "810902", 10_000)]);
        let resumo = gerar_resumo(&[], &tabelas, &[], None);

        assert_eq!(resumo.linhas.len(), 2);
        let linha = resumo.linha("01012024").unwrap();
        assert_eq!(linha.dctf.pis, 100.0);
        assert_eq!(linha.darf.pis, 0.0);
        assert_eq!(linha.divergencia_dctf.pis, 100.0);
        assert_eq!(linha.divergencia_efd.pis, 0.0);
        assert_eq!(linha.efd, PisCofins::ZERO);
    }

    #[test]
    fn mes_fora_da_faixa_mantem_debito_no_fim() {
        let tabelas = dctf(&[
            linha_r10("202413", "810902", 10_000),
            linha_r10("202401", "217201", 46_000),
        ]);
        let resumo = gerar_resumo(&[], &tabelas, &[], None);

        let periodos: Vec<&str> = resumo.periodos().iter().map(|l| l.periodo.as_str()).collect();
        assert_eq!(periodos, ["01012024", "01132024"]);

        let invalido = resumo.linha("01132024").unwrap();
        assert_eq!(invalido.dctf.pis, 100.0);
        assert_eq!(invalido.divergencia_dctf.pis, 100.0);

        let total = resumo.total().unwrap();
        assert_eq!(total.dctf.pis, 100.0);
        assert_eq!(total.dctf.cofins, 460.0);
    }

    #[test]
    fn sem_fontes() {
        let resumo = gerar_resumo(&[], &TabelasDctf::new(), &[], None);

        assert_eq!(resumo.linhas.len(), 1);
        assert!(resumo.periodos().is_empty());
        let total = resumo.total().unwrap();
        assert_eq!(total.periodo, "TOTAL");
        assert!(total.valores().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn dctf_filtra_tipo_e_codigo() {
        let mut r11 = linha_r10("202401", "810902", 50_000);
        r11.replace_range(0..3, "R11");
        let tabelas = dctf(&[
            linha_r10("202401", "810902", 10_000),
            linha_r10("202401", "691201", 5_000),
            linha_r10("202401", "217201", 46_000),
            linha_r10("202401", "056101", 99_999),
            r11,
        ]);
        let somas = somar_dctf(&tabelas);

        assert_eq!(somas.len(), 1);
        assert_eq!(somas["01012024"].pis, 150.0);
        assert_eq!(somas["01012024"].cofins, 460.0);
    }

    #[test]
    fn periodos_de_fontes_diferentes_sao_unidos() {
        let efds = parse_efds(&[efd("01012024", "1.000,00", "4.600,00")]);
        let tabelas = dctf(&[linha_r10("202402", "217201", 46_000)]);
        let resumo = gerar_resumo(&efds, &tabelas, &[], None);

        let periodos: Vec<&str> = resumo.periodos().iter().map(|l| l.periodo.as_str()).collect();
        assert_eq!(periodos, ["01012024", "01022024"]);

        let fev = resumo.linha("01022024").unwrap();
        assert_eq!(fev.efd, PisCofins::ZERO);
        assert_eq!(fev.dctf.cofins, 460.0);

        let jan = resumo.linha("01012024").unwrap();
        assert_eq!(jan.efd.pis, 1000.0);
        assert_eq!(jan.dctf, PisCofins::ZERO);
        assert_eq!(jan.divergencia_efd.cofins, 4600.0);
    }

    #[test]
    fn darf_quita_debito() {
        let itens = extrair_itens_darf(&[ComprovanteDarf {
            nome: "darf.pdf".into(),
            paginas: vec![PAGINA.to_string()],
        }]);
        let efds = parse_efds(&[efd("01012024", "1.000,00", "4.600,00")]);
        let tabelas = dctf(&[
            linha_r10("202401", "810902", 100_000),
            linha_r10("202401", "217201", 460_000),
        ]);

        let resumo = gerar_resumo(&efds, &tabelas, &itens, None);
        let jan = resumo.linha("01012024").unwrap();

        assert_eq!(jan.darf.pis, 1000.0);
        assert_eq!(jan.darf.cofins, 4600.0);
        assert_eq!(jan.divergencia_efd, PisCofins::ZERO);
        assert_eq!(jan.divergencia_dctf, PisCofins::ZERO);
    }

    #[test]
    fn perdcomp_com_codigo() {
        let p = perdcomp(
            &["periodo_apuracao", "cod_receita", "valor_principal"],
            vec![
                vec![texto("Janeiro de 2024"), texto("6912"), Celula::Numero(10.0)],
                vec![texto("Janeiro de 2024"), texto("5856"), Celula::Numero(40.0)],
                vec![texto("Janeiro de 2024"), texto("1234"), Celula::Numero(99.0)],
            ],
        );
        let somas = somar_perdcomp(Some(&p));
        assert_eq!(somas["01012024"], PisCofins { pis: 10.0, cofins: 40.0 });
        assert_eq!(somas["01012024"].get(Tributo::Cofins), 40.0);
    }

    #[test]
    fn perdcomp_sem_codigo_atribui_aos_dois() {
        let p = perdcomp(
            &["periodo_apuracao", "valor_principal_tributo"],
            vec![
                vec![texto("Março de 2024"), Celula::Numero(25.0)],
                vec![texto("Março de 2024"), texto("n/d")],
            ],
        );
        let resumo = gerar_resumo(&[], &TabelasDctf::new(), &[], Some(&p));
        let marco = resumo.linha("01032024").unwrap();

        assert_eq!(marco.perdcomp, PisCofins { pis: 25.0, cofins: 25.0 });
        assert_eq!(marco.divergencia_dctf, PisCofins { pis: -25.0, cofins: -25.0 });
        assert_eq!(resumo.total().unwrap().perdcomp.pis, 25.0);
    }

    #[test]
    fn perdcomp_sem_coluna_de_valor_e_ausente() {
        let p = perdcomp(
            &["periodo_apuracao", "total"],
            vec![vec![texto("Março de 2024"), Celula::Numero(25.0)]],
        );
        assert!(somar_perdcomp(Some(&p)).is_empty());
        assert!(somar_perdcomp(None).is_empty());
    }

    #[test]
    fn valor_invalido_mantem_periodo_com_zero() {
        let efds = parse_efds(&[efd("01052024", "abc", "")]);
        let somas = somar_efd(&efds);
        assert_eq!(somas["01052024"], PisCofins::ZERO);
    }

    #[test]
    fn efd_sem_periodo_nao_entra() {
        let efds = parse_efds(&[Documento::new("x.txt", "|M200|0|0|0|0|0|0|0|0|0|0|0|10,00|\n")]);
        assert!(somar_efd(&efds).is_empty());
    }

    #[test]
    fn ordenacao_cronologica_com_invalidos_no_fim() {
        let linha = |p: &str| {
            LinhaResumo::new(
                p.to_string(),
                PisCofins::ZERO,
                PisCofins::ZERO,
                PisCofins::ZERO,
                PisCofins::ZERO,
            )
        };
        let mut linhas = vec![
            linha("01022024"),
            linha("invalido"),
            linha("01122023"),
            linha("01012024"),
        ];
        ordenar_periodos(&mut linhas);
        let periodos: Vec<&str> = linhas.iter().map(|l| l.periodo.as_str()).collect();
        assert_eq!(periodos, ["01122023", "01012024", "01022024", "invalido"]);
    }

    #[test]
    fn total_e_soma_das_colunas() {
        let efds = parse_efds(&[
            efd("01012024", "1.000,10", "4.600,20"),
            efd("01022024", "2.000,30", "9.200,40"),
        ]);
        let tabelas = dctf(&[
            linha_r10("202401", "810902", 90_000),
            linha_r10("202403", "585601", 12_345),
        ]);
        let resumo = gerar_resumo(&efds, &tabelas, &[], None);
        let total = resumo.total().unwrap();

        let mut esperado = [0.0; NUM_COLUNAS_NUMERICAS];
        for linha in resumo.periodos() {
            for (e, v) in esperado.iter_mut().zip(linha.valores()) {
                *e += v;
            }
        }
        assert_eq!(total.valores(), esperado);
        assert_eq!(resumo.periodos().len(), 3);
    }

    #[test]
    fn valores_ida_e_volta() {
        let linha = LinhaResumo::new(
            "01012024".into(),
            PisCofins { pis: 1.0, cofins: 2.0 },
            PisCofins { pis: 3.0, cofins: 4.0 },
            PisCofins { pis: 5.0, cofins: 6.0 },
            PisCofins { pis: 7.0, cofins: 8.0 },
        );
        assert_eq!(
            LinhaResumo::from_valores(linha.periodo.clone(), linha.valores()),
            linha
        );
        assert_eq!(linha.divergencia_efd, PisCofins { pis: -11.0, cofins: -12.0 });
    }
}
