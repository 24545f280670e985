//! Writers for the `infNFSe` header, `emit` and the computed `valores`.

use super::tree::XmlBuilder;
use crate::core::*;

/// `infNFSe` header elements, `dhProc` set to `processed_at`.
pub(crate) fn write_header(b: &mut XmlBuilder, header: &NfseHeader, processed_at: &str) {
    b.add_element("xLocEmi", &header.emission_location)
        .add_element("xLocPrestacao", &header.service_location)
        .add_element("nNFSe", &header.number)
        .add_element("cLocIncid", &header.incidence_municipality)
        .add_element("xLocIncid", &header.incidence_location)
        .add_element("xTribNac", &header.national_tax_description)
        .add_element("xTribMun", &header.municipal_tax_description)
        .add_element("xNBS", &header.nbs_description)
        .add_element("verAplic", &header.app_version)
        .add_element("ambGer", header.generating_environment)
        .add_element("tpEmis", header.emission_type)
        .add_element("procEmi", header.emission_process)
        .add_element("cStat", header.status)
        .add_date("dhProc", processed_at)
        .add_element("nDFSe", &header.dfse_number);
}

pub(crate) fn write_emitter(b: &mut XmlBuilder, emitter: &Emitter) {
    b.add_group("emit", &[], |b| {
        super::dps::write_identification(b, &emitter.identification);
        b.add_element("IM", &emitter.municipal_registration)
            .add_element("xNome", &emitter.name)
            .add_element("xFant", &emitter.trade_name);
        let address = &emitter.address;
        b.add_group("enderNac", &[], |b| {
            b.add_element("xLgr", &address.street)
                .add_element("nro", &address.number)
                .add_element("xCpl", &address.complement)
                .add_element("xBairro", &address.district)
                .add_element("cMun", &address.municipality_code)
                .add_element("UF", &address.state)
                .add_element("CEP", clean_digits(&address.postal_code));
        });
        b.add_element("fone", emitter.phone.as_deref().map(clean_digits))
            .add_element("email", &emitter.email);
    });
}

pub(crate) fn write_values(b: &mut XmlBuilder, values: &NfseValues) {
    b.add_group("valores", &[], |b| {
        b.add_number("vCalcDR", values.deduction_amount, 2)
            .add_number("vCalcBM", values.benefit_amount, 2)
            .add_number("vBC", values.base, 2)
            .add_number("pAliqAplic", values.applied_rate, 2)
            .add_number("vISSQN", values.iss_amount, 2)
            .add_number("vTotalRet", values.total_withheld, 2)
            .add_number("vLiq", values.net_amount, 2);
    });
}
