use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// SPED NFSe schema version used on `versao` attributes.
pub const SCHEMA_VERSION: &str = "1.00";

/// `DPS`: Declaração de Prestação de Serviços (the `infDPS` block).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dps {
    /// `versao`: schema version.
    pub version: String,
    /// `tpAmb`: production or homologation.
    pub environment: Environment,
    /// `dhEmi`: emission timestamp (ISO-8601).
    pub issued_at: String,
    /// `verAplic`: issuing application version.
    pub app_version: String,
    /// `serie`: DPS series.
    pub series: String,
    /// `nDPS`: sequential DPS number.
    pub number: String,
    /// `dCompet`: competence period, `YYYY-MM` unless a full date is given.
    pub competence: String,
    /// `tpEmit`: who issued the DPS.
    pub emitter_role: EmitterRole,
    /// `cLocEmi`: IBGE code of the emission municipality.
    pub emission_municipality: String,
    /// `subst`: replaced NFSe, if this DPS substitutes one.
    pub substitution: Option<Substitution>,
    /// `prest`: service provider.
    pub provider: Provider,
    /// `toma`: service taker.
    pub taker: Party,
    /// `interm`: intermediary.
    pub intermediary: Option<Party>,
    /// `serv`: service description.
    pub service: Service,
    /// `valores`: amounts and taxation.
    pub values: Values,
}

/// `tpAmb`: identification of the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Environment {
    /// 1: Production.
    Production,
    /// 2: Homologation (testing).
    #[default]
    Homologation,
}

impl Environment {
    pub fn code(&self) -> u8 {
        match self {
            Self::Production => 1,
            Self::Homologation => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Production),
            2 => Some(Self::Homologation),
            _ => None,
        }
    }
}

/// `tpEmit`: role of whoever issued the DPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmitterRole {
    /// 1: Provider.
    #[default]
    Provider,
    /// 2: Taker.
    Taker,
    /// 3: Intermediary.
    Intermediary,
}

impl EmitterRole {
    pub fn code(&self) -> u8 {
        match self {
            Self::Provider => 1,
            Self::Taker => 2,
            Self::Intermediary => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Provider),
            2 => Some(Self::Taker),
            3 => Some(Self::Intermediary),
            _ => None,
        }
    }
}

/// `subst`: the NFSe being replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    /// `chSubstda`: access key of the replaced NFSe.
    pub replaced_key: String,
    /// `cMotivo`: reason code ("01".."05", "99").
    pub reason_code: String,
    /// `xMotivo`: free-text reason.
    pub reason: Option<String>,
}

/// Identification choice of a party. Exactly one identifier, by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Identification {
    /// `CNPJ`
    Cnpj(String),
    /// `CPF`
    Cpf(String),
    /// `NIF`: foreign tax id.
    Nif(String),
    /// `cNaoNIF`: reason code for a foreigner without NIF.
    NoNif(String),
    /// `CAEPF`
    Caepf(String),
}

impl Identification {
    /// XML element name of this choice.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Cnpj(_) => "CNPJ",
            Self::Cpf(_) => "CPF",
            Self::Nif(_) => "NIF",
            Self::NoNif(_) => "cNaoNIF",
            Self::Caepf(_) => "CAEPF",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Self::Cnpj(v) | Self::Cpf(v) | Self::Nif(v) | Self::NoNif(v) | Self::Caepf(v) => v,
        }
    }

    /// The CNPJ/CPF digits, if this is a federal document.
    pub fn federal_document(&self) -> Option<&str> {
        match self {
            Self::Cnpj(v) | Self::Cpf(v) => Some(v),
            _ => None,
        }
    }
}

/// `prest`: service provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub identification: Identification,
    /// `IM`: municipal registration.
    pub municipal_registration: Option<String>,
    /// `xNome`
    pub name: String,
    /// `end`
    pub address: Option<Address>,
    /// `fone`
    pub phone: Option<String>,
    /// `email`
    pub email: Option<String>,
    /// `regTrib`
    pub regime: TaxRegime,
}

/// `toma` / `interm`: taker or intermediary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub identification: Identification,
    /// `IM`: municipal registration.
    pub municipal_registration: Option<String>,
    /// `xNome`
    pub name: String,
    /// `end`
    pub address: Option<Address>,
    /// `fone`
    pub phone: Option<String>,
    /// `email`
    pub email: Option<String>,
}

/// `regTrib`: provider's tax regime.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxRegime {
    /// `opSimpNac`
    pub simples_nacional: SimplesNacional,
    /// `regApTribSN`: Simples Nacional apuration regime (1..3).
    pub simples_apuration: Option<u8>,
    /// `regEspTrib`: special regime (0 = none).
    pub special_regime: u8,
}

/// `opSimpNac`: Simples Nacional option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimplesNacional {
    /// 1: Not opted in.
    #[default]
    NotOptant,
    /// 2: Microempreendedor Individual.
    Mei,
    /// 3: Micro or small company.
    MeEpp,
}

impl SimplesNacional {
    pub fn code(&self) -> u8 {
        match self {
            Self::NotOptant => 1,
            Self::Mei => 2,
            Self::MeEpp => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::NotOptant),
            2 => Some(Self::Mei),
            3 => Some(Self::MeEpp),
            _ => None,
        }
    }
}

/// `end`: postal address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub location: AddressLocation,
    /// `xLgr`
    pub street: String,
    /// `nro`
    pub number: String,
    /// `xCpl`
    pub complement: Option<String>,
    /// `xBairro`
    pub district: String,
}

/// National (`endNac`) or foreign (`endExt`) part of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressLocation {
    National {
        /// `cMun`: IBGE municipality code (7 digits).
        municipality_code: String,
        /// `CEP`: 8 digits.
        postal_code: String,
    },
    Foreign {
        /// `cPais`: ISO 3166-1 alpha-2.
        country_code: String,
        /// `cEndPost`
        postal_code: Option<String>,
        /// `xCidade`
        city: String,
        /// `xEstProvReg`
        state: Option<String>,
    },
}

/// `serv`: the service rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// `locPrest`
    pub location: ServiceLocation,
    /// `cServ`
    pub code: ServiceCode,
    /// `comExt`
    pub foreign_trade: Option<ForeignTrade>,
    /// `lsadppu`
    pub leasing: Option<PropertyLeasing>,
    /// `obra`
    pub construction: Option<ConstructionWork>,
    /// `atvEvento`
    pub event: Option<EventActivity>,
    /// `explRod`
    pub road: Option<RoadExploitation>,
    /// `infoCompl`
    pub complementary: Option<ComplementaryInfo>,
}

/// `locPrest`: where the service was rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceLocation {
    /// `cLocPrestacao`: IBGE municipality code.
    Municipality(String),
    /// `cPaisPrestacao`: ISO country code.
    Country(String),
}

/// `cServ`: service classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCode {
    /// `cTribNac`: national taxation code (6 digits).
    pub national_code: String,
    /// `cTribMun`
    pub municipal_code: Option<String>,
    /// `xDescServ`
    pub description: String,
    /// `cNBS`
    pub nbs_code: Option<String>,
    /// `cIntContrib`
    pub internal_code: Option<String>,
}

/// `comExt`: foreign trade of services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignTrade {
    /// `mdPrestacao`
    pub delivery_mode: u8,
    /// `vincPrest`
    pub relationship: u8,
    /// `tpMoeda`: BACEN currency code.
    pub currency: String,
    /// `vServMoeda`
    pub amount_in_currency: Decimal,
    /// `mecAFComexP`
    pub provider_support: String,
    /// `mecAFComexT`
    pub taker_support: String,
    /// `movTempBens`
    pub temporary_goods: u8,
    /// `nDI`
    pub import_declaration: Option<String>,
    /// `nRE`
    pub export_registration: Option<String>,
    /// `mdic`
    pub send_to_mdic: u8,
}

/// `lsadppu`: lease of movable property (poles, ducts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyLeasing {
    /// `categ`
    pub category: u8,
    /// `objeto`
    pub object: u8,
    /// `extensao`: total length in meters.
    pub length: String,
    /// `nPostes`
    pub poles: u32,
}

/// `obra`: construction work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionWork {
    /// `inscImobFisc`
    pub property_registration: Option<String>,
    pub site: ConstructionSite,
}

/// Identification of the construction site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstructionSite {
    /// `cObra`: CNO/CEI work code.
    WorkCode(String),
    /// `end`
    Address(Address),
}

/// `atvEvento`: event activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventActivity {
    /// `xNome`
    pub name: String,
    /// `dtIni`
    pub start: NaiveDate,
    /// `dtFim`
    pub end: NaiveDate,
    pub site: EventSite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSite {
    /// `idAtvEvt`
    EventId(String),
    /// `end`
    Address(Address),
}

/// `explRod`: toll road exploitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadExploitation {
    /// `categVeic`
    pub vehicle_category: u8,
    /// `nEixos`
    pub axles: u8,
    /// `rodagem`
    pub wheelset: u8,
    /// `sentido`
    pub direction: String,
    /// `placa`
    pub plate: String,
    /// `codAcessoPed`
    pub toll_access_code: String,
    /// `codContrato`
    pub contract_code: String,
}

/// `infoCompl`: complementary information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComplementaryInfo {
    /// `idDocTec`
    pub technical_document: Option<String>,
    /// `docRef`
    pub reference_document: Option<String>,
    /// `xInfComp`
    pub text: Option<String>,
}

/// `valores`: amounts and taxation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Values {
    /// `vServPrest`
    pub service: ServiceAmount,
    /// `vDescCondIncond`
    pub discounts: Option<Discounts>,
    /// `vDedRed`
    pub deduction: Option<Deduction>,
    /// `trib`
    pub taxation: Taxation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServiceAmount {
    /// `vReceb`: amount received by the intermediary.
    pub received: Option<Decimal>,
    /// `vServ`
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Discounts {
    /// `vDescIncond`
    pub unconditional: Option<Decimal>,
    /// `vDescCond`
    pub conditional: Option<Decimal>,
}

/// `vDedRed`: deduction. Percentage and amount are exclusive by business
/// rule; when both are filled the percentage wins (schema order).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Deduction {
    /// `pDR`
    pub percentage: Option<Decimal>,
    /// `vDR`
    pub amount: Option<Decimal>,
}

/// `trib`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxation {
    /// `tribMun`
    pub municipal: MunicipalTax,
    /// `tribFed`
    pub federal: Option<FederalTax>,
    /// `totTrib`
    pub totals: Option<TaxTotals>,
}

/// `tribMun`: ISSQN.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MunicipalTax {
    /// `tribISSQN`
    pub situation: IssqnSituation,
    /// `cPaisResult`: only for exports.
    pub result_country: Option<String>,
    /// `BM`
    pub benefit: Option<MunicipalBenefit>,
    /// `exigSusp`
    pub suspension: Option<SuspendedEnforceability>,
    /// `tpImunidade`: only for immunity.
    pub immunity_type: Option<u8>,
    /// `pAliq`: only for taxable operations.
    pub rate: Option<Decimal>,
    /// `tpRetISSQN`: only for taxable operations.
    pub withholding: Option<IssWithholding>,
}

/// `tribISSQN`: ISSQN taxation situation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IssqnSituation {
    /// 1: Taxable operation.
    #[default]
    Taxable,
    /// 2: Immunity.
    Immune,
    /// 3: Export of services.
    Export,
    /// 4: Non-incidence.
    NonIncidence,
}

impl IssqnSituation {
    pub fn code(&self) -> u8 {
        match self {
            Self::Taxable => 1,
            Self::Immune => 2,
            Self::Export => 3,
            Self::NonIncidence => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Taxable),
            2 => Some(Self::Immune),
            3 => Some(Self::Export),
            4 => Some(Self::NonIncidence),
            _ => None,
        }
    }
}

/// `tpRetISSQN`: who withholds the ISSQN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IssWithholding {
    /// 1: Not withheld.
    #[default]
    NotWithheld,
    /// 2: Withheld by the taker.
    ByTaker,
    /// 3: Withheld by the intermediary.
    ByIntermediary,
}

impl IssWithholding {
    pub fn code(&self) -> u8 {
        match self {
            Self::NotWithheld => 1,
            Self::ByTaker => 2,
            Self::ByIntermediary => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::NotWithheld),
            2 => Some(Self::ByTaker),
            3 => Some(Self::ByIntermediary),
            _ => None,
        }
    }

    pub fn is_withheld(&self) -> bool {
        !matches!(self, Self::NotWithheld)
    }
}

/// `BM`: municipal tax benefit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MunicipalBenefit {
    /// `nBM`
    pub number: String,
    /// `vRedBCBM`
    pub reduction_amount: Option<Decimal>,
    /// `pRedBCBM`
    pub reduction_percentage: Option<Decimal>,
}

/// `exigSusp`: suspended enforceability of the ISSQN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendedEnforceability {
    /// `tpSusp`: 1 judicial, 2 administrative.
    pub kind: u8,
    /// `nProcesso`
    pub process_number: String,
}

/// `tribFed`: federal taxes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FederalTax {
    /// `piscofins`
    pub pis_cofins: Option<PisCofins>,
    /// `vRetCP`
    pub withheld_cp: Option<Decimal>,
    /// `vRetIRRF`
    pub withheld_irrf: Option<Decimal>,
    /// `vRetCSLL`
    pub withheld_csll: Option<Decimal>,
}

/// `piscofins`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PisCofins {
    /// `CST`
    pub cst: String,
    /// `vBCPisCofins`
    pub base: Option<Decimal>,
    /// `pAliqPis`
    pub pis_rate: Option<Decimal>,
    /// `pAliqCofins`
    pub cofins_rate: Option<Decimal>,
    /// `vPis`
    pub pis_amount: Option<Decimal>,
    /// `vCofins`
    pub cofins_amount: Option<Decimal>,
    /// `tpRetPisCofins`: 1 withheld, 2 not withheld.
    pub withholding: Option<u8>,
}

/// `totTrib`: approximate total of taxes. One of the four is emitted,
/// first filled wins in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxTotals {
    /// `vTotTrib`
    pub amounts: Option<TaxSplit>,
    /// `pTotTrib`
    pub percentages: Option<TaxSplit>,
    /// `indTotTrib`
    pub indicator: Option<u8>,
    /// `pTotTribSN`
    pub simples_rate: Option<Decimal>,
}

/// Federal/state/municipal split used by `vTotTrib` and `pTotTrib`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxSplit {
    pub federal: Decimal,
    pub state: Decimal,
    pub municipal: Decimal,
}

/// `NFSe`: the issued note wrapping its DPS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nfse {
    /// `versao`
    pub version: String,
    pub header: NfseHeader,
    /// `emit`
    pub emitter: Emitter,
    /// `valores`: computed from the DPS when absent.
    pub values: Option<NfseValues>,
    /// `DPS`
    pub dps: Dps,
}

/// Header fields of `infNFSe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NfseHeader {
    /// `xLocEmi`
    pub emission_location: String,
    /// `xLocPrestacao`
    pub service_location: String,
    /// `nNFSe`
    pub number: String,
    /// `cLocIncid`: IBGE code of the incidence municipality.
    pub incidence_municipality: String,
    /// `xLocIncid`
    pub incidence_location: Option<String>,
    /// `xTribNac`
    pub national_tax_description: String,
    /// `xTribMun`
    pub municipal_tax_description: Option<String>,
    /// `xNBS`
    pub nbs_description: Option<String>,
    /// `verAplic`
    pub app_version: String,
    /// `ambGer`: 1 municipality, 2 national system.
    pub generating_environment: u8,
    /// `tpEmis`
    pub emission_type: u8,
    /// `procEmi`
    pub emission_process: Option<u8>,
    /// `cStat`
    pub status: u16,
    /// `dhProc`: set by the generator when the document is assembled.
    pub processed_at: Option<String>,
    /// `nDFSe`
    pub dfse_number: String,
}

/// `emit`: legal entity issuing the NFSe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emitter {
    /// CNPJ or CPF only.
    pub identification: Identification,
    /// `IM`
    pub municipal_registration: Option<String>,
    /// `xNome`
    pub name: String,
    /// `xFant`
    pub trade_name: Option<String>,
    /// `enderNac`
    pub address: EmitterAddress,
    /// `fone`
    pub phone: Option<String>,
    /// `email`
    pub email: Option<String>,
}

/// `enderNac`: emitter's national address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterAddress {
    /// `xLgr`
    pub street: String,
    /// `nro`
    pub number: String,
    /// `xCpl`
    pub complement: Option<String>,
    /// `xBairro`
    pub district: String,
    /// `cMun`
    pub municipality_code: String,
    /// `UF`
    pub state: String,
    /// `CEP`
    pub postal_code: String,
}

/// `valores` of the NFSe: amounts computed by the tax authority.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NfseValues {
    /// `vCalcDR`
    pub deduction_amount: Option<Decimal>,
    /// `vCalcBM`
    pub benefit_amount: Option<Decimal>,
    /// `vBC`
    pub base: Decimal,
    /// `pAliqAplic`
    pub applied_rate: Option<Decimal>,
    /// `vISSQN`
    pub iss_amount: Option<Decimal>,
    /// `vTotalRet`
    pub total_withheld: Decimal,
    /// `vLiq`
    pub net_amount: Decimal,
}
